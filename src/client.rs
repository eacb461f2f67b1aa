//! Signing helpers for the parties that talk to the escrow.
//!
//! - Signers agree to a delegation with [`sign_signer_proof`].
//! - Signers sign vouchers with [`sign_rav`].
//! - Receivers obtain allocation proofs with [`sign_allocation_proof`].

use alloy_primitives::{Address, Bytes};
use tap_types::signature::SignerLike;

use crate::escrow::signer_proof_message;

pub use tap_allocation::client::sign_allocation_proof;
pub use tap_verifier::client::sign_rav;

/// Signs the proof by which `signer` agrees to sign vouchers for `sender` on the escrow
/// at `escrow`.
pub async fn sign_signer_proof<S: SignerLike + Sync>(
    signer: &S,
    chain_id: u64,
    escrow: Address,
    sender: Address,
) -> Result<Bytes, alloy_signer::Error> {
    let message = signer_proof_message(chain_id, escrow, sender);
    let signature = signer.sign_message(message.as_slice()).await?;
    Ok(Bytes::from(signature.as_bytes()))
}
