use alloy_primitives::{Address, U256};
use tap_allocation::AllocationGuardError;
use tap_types::timestamp::UnixTimestamp;
use tap_verifier::VoucherError;

use crate::collaborators::{CollectionError, TransferError};

/// Every way an escrow operation can fail. A failed operation leaves no trace:
/// no balance, delegation, allocation record or event is changed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Insufficient collateral: {available} available, {required} required")]
    InsufficientCollateral { available: U256, required: U256 },
    #[error("Collateral is not thawing")]
    CollateralNotThawing,
    #[error("Collateral is still thawing: now {current_time}, thaw ends at {thaw_end}")]
    CollateralStillThawing {
        current_time: UnixTimestamp,
        thaw_end: UnixTimestamp,
    },
    #[error("Signer {signer} is already authorized by {sender}")]
    SignerAlreadyAuthorized { signer: Address, sender: Address },
    #[error("Invalid proof for signer {signer}: {reason}")]
    InvalidSignerProof { signer: Address, reason: String },
    #[error("Signer {signer} is not authorized by {caller}")]
    SignerNotAuthorizedBySender { signer: Address, caller: Address },
    #[error("Signer {signer} is not thawing")]
    SignerNotThawing { signer: Address },
    #[error("Signer is still thawing: now {current_time}, thaw ends at {thaw_end}")]
    SignerStillThawing {
        current_time: UnixTimestamp,
        thaw_end: UnixTimestamp,
    },
    #[error("Voucher signer {signer} is not authorized by any sender")]
    InvalidRavSigner { signer: Address },
    #[error("Got {receivers} receivers and {amounts} amounts")]
    InputsLengthMismatch { receivers: usize, amounts: usize },
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
    #[error(transparent)]
    Voucher(#[from] VoucherError),
    #[error(transparent)]
    Allocation(#[from] AllocationGuardError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}
