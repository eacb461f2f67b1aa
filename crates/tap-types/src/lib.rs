#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types shared across the TAP escrow workspace.
//!
//! This crate provides the foundational primitives used by the voucher verifier,
//! the allocation replay guard and the collateral escrow itself. It has no knowledge
//! of escrow semantics; it only defines how time, signatures and configuration values
//! are represented.
//!
//! # Modules
//!
//! - [`config`] - Configuration values that may be literals or environment variable references
//! - [`signature`] - ECDSA signature parsing and signer recovery over 32-byte digests
//! - [`timestamp`] - Unix timestamp utilities for thawing deadlines
//!
//! # Feature Flags
//!
//! - `client` - Enables [`signature::SignerLike`] for producing signatures with local keys
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod config;
pub mod signature;
pub mod timestamp;
