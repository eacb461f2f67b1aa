#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Receipt aggregate voucher (RAV) verification.
//!
//! A RAV is an off-chain attestation, signed by a sender's delegated signer, of the
//! cumulative value owed to a receiver for one allocation. This crate defines the
//! voucher's EIP-712 shape and the [`VoucherVerifier`] that turns a signed voucher back
//! into the address of the key that signed it.
//!
//! # Digest
//!
//! Vouchers are hashed with [EIP-712](https://eips.ethereum.org/EIPS/eip-712) typed
//! structured data under the domain
//!
//! ```text
//! EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)
//! name = "TAP", version = "1"
//! ```
//!
//! so a voucher signature can never be replayed as any other signed structure, nor
//! against a verifier deployed on another chain or at another address.
//!
//! # Feature Flags
//!
//! - `client` - Voucher signing with a [`SignerLike`](tap_types::signature::SignerLike) key
//! - `telemetry` - Tracing instrumentation

pub mod rav;
pub mod verifier;

#[cfg(feature = "client")]
pub mod client;

pub use rav::*;
pub use verifier::*;
