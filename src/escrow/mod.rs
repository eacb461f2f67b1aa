//! The collateral escrow.
//!
//! [`CollateralEscrow`] owns two tables and three state machines over them:
//!
//! - **Collateral accounts**, keyed by `(sender, receiver)`: deposits, and the
//!   thaw/withdraw cycle that lets a sender reclaim unused collateral after a notice
//!   period ([`account`]).
//! - **Signer authorizations**, keyed by signer: delegation of voucher signing to a
//!   third-party key, and its thaw/revoke cycle ([`signer`]).
//! - **Redemption**, which joins the two through a signed voucher and consumes the
//!   voucher's allocation in the [`AllocationReplayGuard`] ([`redeem`]).
//!
//! # Atomicity
//!
//! The host ledger runs one call at a time, modelled here by `&mut self`. Each
//! operation validates all of its preconditions and performs all of its fallible
//! external calls before it writes anything, so a failure anywhere leaves the escrow,
//! the replay guard and the event log exactly as they were.
//!
//! # Clamping
//!
//! `withdraw` and `redeem` pay out what is actually available rather than failing when
//! a balance has shrunk; `thaw` and `authorize_signer` fail on any precondition
//! violation. The two policies are deliberately different.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use tap_allocation::AllocationReplayGuard;
use tap_verifier::VoucherVerifier;

use crate::clock::Clock;
use crate::collaborators::{CollectionSink, ValueTransfer};
use crate::config::{ConfigError, EscrowConfig};
use crate::error::EscrowError;
use crate::events::EscrowEvent;

#[cfg(feature = "telemetry")]
use tracing::instrument;

pub mod account;
pub mod redeem;
pub mod signer;


pub use account::*;
pub use redeem::*;
pub use signer::*;

pub struct CollateralEscrow<T, S, C> {
    config: EscrowConfig,
    token: T,
    staking: S,
    clock: C,
    verifier: VoucherVerifier,
    allocation_guard: AllocationReplayGuard,
    accounts: HashMap<(Address, Address), CollateralAccount>,
    authorized_signers: HashMap<Address, SignerAuthorization>,
    events: Vec<EscrowEvent>,
}

impl<T, S, C> CollateralEscrow<T, S, C>
where
    T: ValueTransfer,
    S: CollectionSink,
    C: Clock,
{
    /// Builds an escrow with empty tables, its verifier and its replay guard.
    pub fn new(config: EscrowConfig, token: T, staking: S, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let verifier = VoucherVerifier::new(config.chain_id, config.verifier);
        let allocation_guard =
            AllocationReplayGuard::new(config.chain_id, config.allocation_tracker);
        Ok(Self {
            config,
            token,
            staking,
            clock,
            verifier,
            allocation_guard,
            accounts: HashMap::new(),
            authorized_signers: HashMap::new(),
            events: Vec::new(),
        })
    }

    /// Grants the collection sink unlimited pull rights over the escrow's holdings,
    /// so redemptions need no per-call approval.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(staking = %self.config.staking)))]
    pub async fn approve_all(&mut self) -> Result<(), EscrowError> {
        self.token.approve(self.config.staking, U256::MAX).await?;
        Ok(())
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    pub fn verifier(&self) -> &VoucherVerifier {
        &self.verifier
    }

    pub fn allocation_guard(&self) -> &AllocationReplayGuard {
        &self.allocation_guard
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn staking(&self) -> &S {
        &self.staking
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// All events emitted so far, oldest first.
    pub fn events(&self) -> &[EscrowEvent] {
        &self.events
    }

    /// Drains the event log.
    pub fn take_events(&mut self) -> Vec<EscrowEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: EscrowEvent) {
        #[cfg(feature = "telemetry")]
        tracing::info!(event = event.name(), details = ?event, "escrow event");
        self.events.push(event);
    }
}
