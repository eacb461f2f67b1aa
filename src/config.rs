//! Escrow deployment configuration.
//!
//! Everything here is fixed when the escrow is constructed: the identities of the
//! collaborators it talks to and the two thawing periods.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Upper bound for both thawing periods: 90 days.
pub const MAX_THAWING_PERIOD: u64 = 90 * 24 * 60 * 60;

/// Immutable configuration of a [`CollateralEscrow`](crate::CollateralEscrow).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowConfig {
    /// Chain the escrow and its collaborators live on. Bound into every digest.
    pub chain_id: u64,
    /// Address of the escrow itself.
    pub escrow: Address,
    /// Fungible token collateral is denominated in.
    pub token: Address,
    /// Collection sink that receives redeemed value.
    pub staking: Address,
    /// Voucher verifier, the `verifyingContract` of the voucher EIP-712 domain.
    pub verifier: Address,
    /// Allocation replay guard.
    pub allocation_tracker: Address,
    /// Seconds a sender waits between `thaw` and `withdraw`.
    pub withdraw_escrow_thawing_period: u64,
    /// Seconds a sender waits between `thaw_signer` and `revoke_authorized_signer`.
    pub revoke_signer_thawing_period: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Withdraw thawing period {thawing_period}s exceeds the maximum of {max_thawing_period}s")]
    WithdrawEscrowThawingTooLong {
        thawing_period: u64,
        max_thawing_period: u64,
    },
    #[error("Revoke thawing period {thawing_period}s exceeds the maximum of {max_thawing_period}s")]
    RevokeSignerThawingTooLong {
        thawing_period: u64,
        max_thawing_period: u64,
    },
}

impl EscrowConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.withdraw_escrow_thawing_period > MAX_THAWING_PERIOD {
            return Err(ConfigError::WithdrawEscrowThawingTooLong {
                thawing_period: self.withdraw_escrow_thawing_period,
                max_thawing_period: MAX_THAWING_PERIOD,
            });
        }
        if self.revoke_signer_thawing_period > MAX_THAWING_PERIOD {
            return Err(ConfigError::RevokeSignerThawingTooLong {
                thawing_period: self.revoke_signer_thawing_period,
                max_thawing_period: MAX_THAWING_PERIOD,
            });
        }
        Ok(())
    }
}
