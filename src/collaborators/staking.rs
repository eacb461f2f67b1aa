use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{CollectionError, CollectionSink, InMemoryToken};

/// A collection sink that pulls redeemed value from the escrow and keeps a
/// per-allocation tally. Clones share the same tally.
///
/// Pulling requires the escrow to have approved this sink, see
/// [`CollateralEscrow::approve_all`](crate::CollateralEscrow::approve_all).
#[derive(Debug, Clone)]
pub struct InMemoryStaking {
    address: Address,
    escrow: Address,
    token: InMemoryToken,
    collected: Arc<Mutex<HashMap<Address, U256>>>,
}

impl InMemoryStaking {
    pub fn new(address: Address, escrow: Address, token: InMemoryToken) -> Self {
        Self {
            address,
            escrow,
            token,
            collected: Arc::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Total value collected for `allocation_id`.
    pub async fn collected(&self, allocation_id: Address) -> U256 {
        self.collected
            .lock()
            .await
            .get(&allocation_id)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CollectionSink for InMemoryStaking {
    async fn collect(&self, amount: U256, allocation_id: Address) -> Result<(), CollectionError> {
        let mut collected = self.collected.lock().await;
        let tally = collected
            .get(&allocation_id)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| {
                CollectionError::Rejected(format!("tally for {allocation_id} would overflow"))
            })?;
        self.token
            .transfer_from(self.address, self.escrow, self.address, amount)
            .await?;
        collected.insert(allocation_id, tally);
        Ok(())
    }
}
