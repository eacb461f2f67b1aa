//! Signer delegation and its thaw/revoke cycle.
//!
//! A sender may let another key sign vouchers on its behalf. The key must agree: the
//! sender presents a proof, signed by the candidate signer, over a message that binds
//! the chain, the escrow and the sender. A signer belongs to at most one sender at a
//! time, and can only be released after the revocation thawing period, so receivers
//! holding vouchers from that signer have time to redeem them.

use alloy_primitives::{Address, B256, U256, keccak256};
use alloy_sol_types::SolValue;
use serde::Serialize;
use tap_types::signature::recover_from_message;
use tap_types::timestamp::UnixTimestamp;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::{CollateralAccount, CollateralEscrow};
use crate::clock::Clock;
use crate::collaborators::{CollectionSink, ValueTransfer};
use crate::error::EscrowError;
use crate::events::EscrowEvent;

/// Revocation notice state of a delegated signer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SignerThaw {
    #[default]
    Active,
    /// The sender may revoke the signer from `thaw_end` on.
    Thawing { thaw_end: UnixTimestamp },
}

/// Delegation of a signer to a sender. Absence from the table means unauthorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerAuthorization {
    pub sender: Address,
    pub thaw: SignerThaw,
}

impl SignerAuthorization {
    pub fn thaw_end(&self) -> Option<UnixTimestamp> {
        match self.thaw {
            SignerThaw::Active => None,
            SignerThaw::Thawing { thaw_end } => Some(thaw_end),
        }
    }
}

/// Message a signer signs (as an EIP-191 personal message) to agree to sign for `sender`
/// on the escrow at `escrow`.
///
/// `keccak256(abi.encodePacked(uint256 chainId, address escrow, address sender))`
pub fn signer_proof_message(chain_id: u64, escrow: Address, sender: Address) -> B256 {
    keccak256((U256::from(chain_id), escrow, sender).abi_encode_packed())
}

impl<T, S, C> CollateralEscrow<T, S, C>
where
    T: ValueTransfer,
    S: CollectionSink,
    C: Clock,
{
    pub fn authorized_signer(&self, signer: Address) -> Option<&SignerAuthorization> {
        self.authorized_signers.get(&signer)
    }

    /// The account of `signer`'s current sender for `receiver`.
    ///
    /// An undelegated signer yields an empty account rather than an error.
    pub fn get_escrow_account_from_signer(
        &self,
        signer: Address,
        receiver: Address,
    ) -> CollateralAccount {
        match self.authorized_signers.get(&signer) {
            Some(authorization) => self.get_escrow_account(authorization.sender, receiver),
            None => CollateralAccount::default(),
        }
    }

    pub fn signer_proof_message(&self, sender: Address) -> B256 {
        signer_proof_message(self.config.chain_id, self.config.escrow, sender)
    }

    /// Delegates voucher signing for the caller to `signer`.
    #[cfg_attr(feature = "telemetry", instrument(skip(self, proof), err))]
    pub fn authorize_signer(
        &mut self,
        caller: Address,
        signer: Address,
        proof: &[u8],
    ) -> Result<(), EscrowError> {
        if let Some(existing) = self.authorized_signers.get(&signer) {
            return Err(EscrowError::SignerAlreadyAuthorized {
                signer,
                sender: existing.sender,
            });
        }
        let message = self.signer_proof_message(caller);
        let recovered = recover_from_message(proof, message.as_slice()).map_err(|e| {
            EscrowError::InvalidSignerProof {
                signer,
                reason: e.to_string(),
            }
        })?;
        if recovered != signer {
            return Err(EscrowError::InvalidSignerProof {
                signer,
                reason: format!("proof signed by {recovered}"),
            });
        }

        self.authorized_signers.insert(
            signer,
            SignerAuthorization {
                sender: caller,
                thaw: SignerThaw::Active,
            },
        );
        self.emit(EscrowEvent::AuthorizeSigner {
            signer,
            sender: caller,
        });
        Ok(())
    }

    /// Starts, or restarts, the revocation thawing period of one of the caller's signers.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub fn thaw_signer(&mut self, caller: Address, signer: Address) -> Result<(), EscrowError> {
        self.owned_authorization(caller, signer)?;
        let thaw_end = self
            .clock
            .now()
            .checked_add_secs(self.config.revoke_signer_thawing_period)
            .ok_or(EscrowError::ArithmeticOverflow)?;

        if let Some(authorization) = self.authorized_signers.get_mut(&signer) {
            authorization.thaw = SignerThaw::Thawing { thaw_end };
        }
        self.emit(EscrowEvent::ThawSigner {
            sender: caller,
            signer,
            thaw_end_timestamp: thaw_end,
        });
        Ok(())
    }

    /// Abandons a pending revocation; the signer stays authorized.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub fn cancel_thaw_signer(
        &mut self,
        caller: Address,
        signer: Address,
    ) -> Result<(), EscrowError> {
        let authorization = self.owned_authorization(caller, signer)?;
        let thaw_end = authorization
            .thaw_end()
            .ok_or(EscrowError::SignerNotThawing { signer })?;

        if let Some(authorization) = self.authorized_signers.get_mut(&signer) {
            authorization.thaw = SignerThaw::Active;
        }
        self.emit(EscrowEvent::CancelThawSigner {
            sender: caller,
            signer,
            thaw_end_timestamp: thaw_end,
        });
        Ok(())
    }

    /// Removes the delegation once its revocation thawing period has elapsed. The
    /// signer is then free to be authorized again, by any sender.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub fn revoke_authorized_signer(
        &mut self,
        caller: Address,
        signer: Address,
    ) -> Result<(), EscrowError> {
        let authorization = self.owned_authorization(caller, signer)?;
        let thaw_end = authorization
            .thaw_end()
            .ok_or(EscrowError::SignerNotThawing { signer })?;
        let current_time = self.clock.now();
        if current_time < thaw_end {
            return Err(EscrowError::SignerStillThawing {
                current_time,
                thaw_end,
            });
        }

        self.authorized_signers.remove(&signer);
        self.emit(EscrowEvent::RevokeAuthorizedSigner {
            sender: caller,
            signer,
        });
        Ok(())
    }

    fn owned_authorization(
        &self,
        caller: Address,
        signer: Address,
    ) -> Result<SignerAuthorization, EscrowError> {
        self.authorized_signers
            .get(&signer)
            .filter(|authorization| authorization.sender == caller)
            .copied()
            .ok_or(EscrowError::SignerNotAuthorizedBySender { signer, caller })
    }
}
