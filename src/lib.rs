#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Collateral escrow and settlement for the Timeline Aggregation Protocol (TAP).
//!
//! TAP is a bilateral, off-chain metered-payment protocol. A **sender** pre-funds
//! collateral for a **receiver**; as the receiver serves usage, a signer delegated by
//! the sender hands out receipt aggregate vouchers (RAVs) asserting the cumulative
//! value owed for one allocation. The receiver redeems the latest voucher against
//! the collateral.
//!
//! # Components
//!
//! - [`tap_verifier::VoucherVerifier`] - EIP-712 voucher digest and signer recovery
//! - [`tap_allocation::AllocationReplayGuard`] - Each allocation is redeemed at most once per sender
//! - [`CollateralEscrow`] - Balances, the thaw/withdraw cycle, signer delegation and redemption
//!
//! # Modules
//!
//! - [`clock`] - Ledger time
//! - [`collaborators`] - Value-transfer and collection-sink interfaces, with in-memory implementations
//! - [`config`] - Immutable escrow configuration
//! - [`escrow`] - The escrow state machines
//! - [`events`] - Events emitted by successful operations
//!
//! # Example
//!
//! ```ignore
//! use tap_escrow::{CollateralEscrow, ManualClock, InMemoryToken, InMemoryStaking};
//!
//! let token = InMemoryToken::new();
//! let staking = InMemoryStaking::new(config.staking, config.escrow, token.clone());
//! let mut escrow = CollateralEscrow::new(
//!     config.clone(),
//!     token.for_escrow(config.escrow),
//!     staking,
//!     ManualClock::default(),
//! )?;
//! escrow.approve_all().await?;
//!
//! escrow.deposit(sender, receiver, U256::from(1_000)).await?;
//! escrow.authorize_signer(sender, signer, &signer_proof)?;
//! let redemption = escrow.redeem(receiver, &signed_rav, &allocation_proof).await?;
//! ```
//!
//! # Feature Flags
//!
//! - `client` - Proof and voucher signing helpers for senders, signers and receivers
//! - `telemetry` - Tracing instrumentation of every operation and event

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod escrow;
pub mod events;

#[cfg(feature = "client")]
pub mod client;

pub use clock::*;
pub use collaborators::*;
pub use config::*;
pub use error::*;
pub use escrow::*;
pub use events::*;
