//! ECDSA signature handling for vouchers and proofs.
//!
//! Every signature the escrow accepts is a secp256k1 ECDSA signature produced by an
//! externally owned account, either over an EIP-712 digest (vouchers) or over an
//! EIP-191 personal message (signer and allocation proofs). This module normalizes
//! the two accepted encodings and recovers the signing address:
//!
//! - **65 bytes**: `r || s || v`, with `v` in `{0, 1, 27, 28}`.
//! - **64 bytes**: compact [EIP-2098](https://eips.ethereum.org/EIPS/eip-2098) `r || yParityAndS`.
//!
//! Signatures with a high `s` value are rejected so that a signature cannot be mutated
//! into a second valid encoding of the same authorization.

use alloy_primitives::{Address, B256, Signature, U256, uint};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Half of the secp256k1 curve order. Canonical signatures keep `s` at or below it.
const SECP256K1N_HALF: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureFormatError {
    #[error("Signature must be 64 or 65 bytes long, got {0}")]
    InvalidLength(usize),
    #[error("Invalid signature encoding: {0}")]
    InvalidEncoding(String),
    #[error("Signature has a non-canonical (high) s value")]
    NonCanonical,
    #[error("Signer recovery failed: {0}")]
    Recovery(String),
}

/// Parses raw signature bytes into a canonical [`Signature`].
pub fn parse_signature(bytes: &[u8]) -> Result<Signature, SignatureFormatError> {
    let signature = match bytes.len() {
        65 => Signature::from_raw(bytes)
            .map_err(|e| SignatureFormatError::InvalidEncoding(e.to_string()))?,
        64 => Signature::from_erc2098(bytes),
        other => return Err(SignatureFormatError::InvalidLength(other)),
    };
    if signature.s() > SECP256K1N_HALF {
        return Err(SignatureFormatError::NonCanonical);
    }
    Ok(signature)
}

/// Recovers the address that signed the 32-byte `prehash` (typically an EIP-712 digest).
#[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(prehash = %prehash)))]
pub fn recover_from_prehash(
    signature: &[u8],
    prehash: &B256,
) -> Result<Address, SignatureFormatError> {
    let signature = parse_signature(signature)?;
    signature
        .recover_address_from_prehash(prehash)
        .map_err(|e| SignatureFormatError::Recovery(e.to_string()))
}

/// Recovers the address that signed `message` as an EIP-191 personal message.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err))]
pub fn recover_from_message(
    signature: &[u8],
    message: &[u8],
) -> Result<Address, SignatureFormatError> {
    let signature = parse_signature(signature)?;
    signature
        .recover_address_from_msg(message)
        .map_err(|e| SignatureFormatError::Recovery(e.to_string()))
}

#[cfg(feature = "client")]
mod client {
    use alloy_primitives::{Address, B256, Signature, eip191_hash_message};
    use alloy_signer_local::PrivateKeySigner;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// A trait that abstracts signing operations, allowing both owned signers and Arc-wrapped signers.
    ///
    /// Alloy's `Signer` trait is not implemented for `Arc<T>`, while `PrivateKeySigner`
    /// does not implement `Clone`; wallets that sign vouchers and proofs from several
    /// tasks share one key through `Arc`.
    #[async_trait]
    pub trait SignerLike {
        /// Returns the address of the signer.
        fn address(&self) -> Address;

        /// Signs the given 32-byte digest without any prefixing.
        async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error>;

        /// Signs `message` as an EIP-191 personal message.
        async fn sign_message(&self, message: &[u8]) -> Result<Signature, alloy_signer::Error> {
            self.sign_hash(&eip191_hash_message(message)).await
        }
    }

    #[async_trait]
    impl SignerLike for PrivateKeySigner {
        fn address(&self) -> Address {
            PrivateKeySigner::address(self)
        }

        async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
            alloy_signer::Signer::sign_hash(self, hash).await
        }
    }

    #[async_trait]
    impl<T: SignerLike + Send + Sync> SignerLike for Arc<T> {
        fn address(&self) -> Address {
            (**self).address()
        }

        async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
            (**self).sign_hash(hash).await
        }
    }
}

#[cfg(feature = "client")]
pub use client::SignerLike;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{eip191_hash_message, keccak256};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn test_recover_from_prehash() {
        let signer = PrivateKeySigner::random();
        let digest = keccak256(b"voucher");
        let signature = signer.sign_hash_sync(&digest).unwrap();
        let recovered = recover_from_prehash(&signature.as_bytes(), &digest).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_recover_compact_signature() {
        let signer = PrivateKeySigner::random();
        let digest = keccak256(b"compact");
        let signature = signer.sign_hash_sync(&digest).unwrap();
        let compact = signature.as_erc2098();
        let recovered = recover_from_prehash(&compact, &digest).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_recover_from_message_matches_eip191() {
        let signer = PrivateKeySigner::random();
        let message = keccak256(b"proof");
        let signature = signer
            .sign_hash_sync(&eip191_hash_message(message))
            .unwrap();
        let recovered = recover_from_message(&signature.as_bytes(), message.as_slice()).unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_reject_wrong_length() {
        let digest = keccak256(b"short");
        let err = recover_from_prehash(&[0u8; 12], &digest).unwrap_err();
        assert_eq!(err, SignatureFormatError::InvalidLength(12));
    }

    #[test]
    fn test_reject_high_s() {
        let signer = PrivateKeySigner::random();
        let digest = keccak256(b"malleable");
        let signature = signer.sign_hash_sync(&digest).unwrap();
        let n = uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);
        let flipped = Signature::new(signature.r(), n - signature.s(), !signature.v());
        let err = parse_signature(&flipped.as_bytes()).unwrap_err();
        assert_eq!(err, SignatureFormatError::NonCanonical);
    }

    #[test]
    fn test_reject_invalid_v() {
        let signer = PrivateKeySigner::random();
        let digest = keccak256(b"bad v");
        let mut bytes = signer.sign_hash_sync(&digest).unwrap().as_bytes();
        bytes[64] = 30;
        assert!(matches!(
            parse_signature(&bytes),
            Err(SignatureFormatError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_zero_signature_fails_recovery() {
        let digest = keccak256(b"zero");
        let mut bytes = [0u8; 65];
        bytes[64] = 27;
        assert!(matches!(
            recover_from_prehash(&bytes, &digest),
            Err(SignatureFormatError::Recovery(_))
        ));
    }
}
