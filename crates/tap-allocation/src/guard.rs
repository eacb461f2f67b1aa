use alloy_primitives::{Address, B256, U256, keccak256};
use alloy_sol_types::SolValue;
use std::collections::HashMap;
use tap_types::signature::{SignatureFormatError, recover_from_message};

#[cfg(feature = "telemetry")]
use tracing::instrument;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AllocationGuardError {
    #[error("Allocation {allocation_id} was previously claimed for sender {sender}")]
    AllocationPreviouslyClaimed {
        sender: Address,
        allocation_id: Address,
    },
    #[error("Invalid allocation proof: signed by {recovered}, expected {expected}")]
    InvalidProof { expected: Address, recovered: Address },
    #[error("Malformed allocation proof: {0}")]
    MalformedProof(#[from] SignatureFormatError),
}

/// Message an allocation key signs (as an EIP-191 personal message) to let `sender`'s
/// voucher for `allocation_id` be redeemed through the guard deployed at `guard`.
///
/// `keccak256(abi.encodePacked(uint256 chainId, address sender, address allocationId, address guard))`
pub fn allocation_proof_message(
    chain_id: u64,
    guard: Address,
    sender: Address,
    allocation_id: Address,
) -> B256 {
    keccak256((U256::from(chain_id), sender, allocation_id, guard).abi_encode_packed())
}

/// A validated, not yet recorded, consumption of an allocation.
///
/// Only [`AllocationReplayGuard::check_allocation_id`] produces one, and it must be
/// committed within the same state-changing call that checked it.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct AllocationClaim {
    sender: Address,
    allocation_id: Address,
    recovered: Address,
}

impl AllocationClaim {
    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn allocation_id(&self) -> Address {
        self.allocation_id
    }

    /// Address recovered from the allocation proof.
    pub fn recovered(&self) -> Address {
        self.recovered
    }
}

/// Tracks consumed allocations per sender.
#[derive(Debug, Clone)]
pub struct AllocationReplayGuard {
    chain_id: u64,
    address: Address,
    consumed: HashMap<(Address, Address), Address>,
}

impl AllocationReplayGuard {
    pub fn new(chain_id: u64, address: Address) -> Self {
        Self {
            chain_id,
            address,
            consumed: HashMap::new(),
        }
    }

    /// Identity of this guard, bound into every proof message.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn proof_message(&self, sender: Address, allocation_id: Address) -> B256 {
        allocation_proof_message(self.chain_id, self.address, sender, allocation_id)
    }

    pub fn is_allocation_id_used(&self, sender: Address, allocation_id: Address) -> bool {
        self.consumed.contains_key(&(sender, allocation_id))
    }

    /// Address recovered from the proof that consumed the allocation, if any.
    pub fn consumed_by(&self, sender: Address, allocation_id: Address) -> Option<Address> {
        self.consumed.get(&(sender, allocation_id)).copied()
    }

    /// Validates that `allocation_id` is unused for `sender` and that `proof` was
    /// signed by the allocation key, without recording anything.
    #[cfg_attr(feature = "telemetry", instrument(skip(self, proof), err))]
    pub fn check_allocation_id(
        &self,
        sender: Address,
        allocation_id: Address,
        proof: &[u8],
    ) -> Result<AllocationClaim, AllocationGuardError> {
        if self.is_allocation_id_used(sender, allocation_id) {
            return Err(AllocationGuardError::AllocationPreviouslyClaimed {
                sender,
                allocation_id,
            });
        }
        let message = self.proof_message(sender, allocation_id);
        let recovered = recover_from_message(proof, message.as_slice())?;
        if recovered != allocation_id {
            return Err(AllocationGuardError::InvalidProof {
                expected: allocation_id,
                recovered,
            });
        }
        Ok(AllocationClaim {
            sender,
            allocation_id,
            recovered,
        })
    }

    /// Records a checked claim. Records are permanent.
    pub fn commit(&mut self, claim: AllocationClaim) {
        #[cfg(feature = "telemetry")]
        tracing::debug!(
            sender = %claim.sender,
            allocation_id = %claim.allocation_id,
            "allocation consumed"
        );
        self.consumed
            .entry((claim.sender, claim.allocation_id))
            .or_insert(claim.recovered);
    }

    /// Checks and records the consumption of `allocation_id` for `sender` in one step.
    ///
    /// Returns the address recovered from `proof`.
    pub fn use_allocation_id(
        &mut self,
        sender: Address,
        allocation_id: Address,
        proof: &[u8],
    ) -> Result<Address, AllocationGuardError> {
        let claim = self.check_allocation_id(sender, allocation_id, proof)?;
        let recovered = claim.recovered();
        self.commit(claim);
        Ok(recovered)
    }
}
