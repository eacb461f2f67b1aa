//! External collaborators of the escrow.
//!
//! The escrow does not move value itself. It relies on two components owned by the
//! host ledger, specified here only at their interface boundary:
//!
//! | Trait | Role | In-memory implementation |
//! |-------|------|--------------------------|
//! | [`ValueTransfer`] | Moves collateral in and out of the escrow | [`EscrowToken`] over [`InMemoryToken`] |
//! | [`CollectionSink`] | Receives redeemed value, tagged by allocation | [`InMemoryStaking`] |
//!
//! The in-memory implementations back the tests and the simulator.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

pub mod staking;
pub mod token;

pub use staking::*;
pub use token::*;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient balance: {account} holds {available}, {required} required")]
    InsufficientBalance {
        account: Address,
        available: U256,
        required: U256,
    },
    #[error(
        "Insufficient allowance: {spender} may move {available} from {owner}, {required} required"
    )]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: U256,
        required: U256,
    },
    #[error("Balance of {0} would overflow")]
    BalanceOverflow(Address),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("Collection rejected: {0}")]
    Rejected(String),
}

/// Fungible-value transfer interface, as seen from the escrow's own holdings.
#[async_trait]
pub trait ValueTransfer: Send + Sync {
    /// Moves `amount` from `from` into the escrow. Fails if `from` has not approved the
    /// escrow for at least `amount` or does not hold it.
    async fn pull(&self, from: Address, amount: U256) -> Result<(), TransferError>;

    /// Moves `amount` out of the escrow to `to`.
    async fn push(&self, to: Address, amount: U256) -> Result<(), TransferError>;

    /// Lets `spender` pull up to `amount` from the escrow's holdings.
    async fn approve(&self, spender: Address, amount: U256) -> Result<(), TransferError>;
}

/// Staking-side sink for redeemed value.
#[async_trait]
pub trait CollectionSink: Send + Sync {
    async fn collect(&self, amount: U256, allocation_id: Address) -> Result<(), CollectionError>;
}
