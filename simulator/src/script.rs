//! Scripts of escrow operations.
//!
//! A script names its keys once and refers to parties by name afterwards:
//!
//! ```json
//! {
//!   "keys": {
//!     "sender": "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
//!     "signer": "$SIGNER_PRIVATE_KEY"
//!   },
//!   "steps": [
//!     { "op": "mint", "to": "sender", "amount": "1000" },
//!     { "op": "approve", "owner": "sender", "amount": "1000" },
//!     { "op": "deposit", "sender": "sender", "receiver": "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC", "amount": "1000" },
//!     { "op": "advanceTime", "seconds": 3600 },
//!     { "op": "withdraw", "sender": "sender", "receiver": "0x3C44...", "expectFailure": true }
//!   ]
//! }
//! ```
//!
//! A party is either a key name or a literal address. Operations that need a signature
//! (signer proofs, vouchers, allocation proofs) require a key name, unless the step
//! carries the hex signature itself.

use alloy_primitives::{Address, Bytes, U256};
use alloy_signer_local::PrivateKeySigner;
use serde::Deserialize;
use std::collections::BTreeMap;
use tap_types::config::LiteralOrEnv;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Unknown party '{0}': neither a key name nor an address")]
    UnknownParty(String),
    #[error("Party '{0}' must be a key name to sign")]
    MissingKey(String),
    #[error("Failed to sign: {0}")]
    Signing(#[from] alloy_signer::Error),
    #[error(transparent)]
    Escrow(#[from] tap_escrow::EscrowError),
    #[error(transparent)]
    Transfer(#[from] tap_escrow::TransferError),
    #[error("Voucher value {0} does not fit in uint128")]
    ValueOutOfRange(U256),
}

/// Narrows a script amount to the voucher's `uint128 valueAggregate`.
pub fn voucher_value(value: U256) -> Result<u128, ScriptError> {
    u128::try_from(value).map_err(|_| ScriptError::ValueOutOfRange(value))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Private keys by party name.
    #[serde(default)]
    pub keys: BTreeMap<String, LiteralOrEnv<PrivateKeySigner>>,
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn address_of(&self, party: &str) -> Result<Address, ScriptError> {
        if let Some(key) = self.keys.get(party) {
            return Ok(key.address());
        }
        party
            .parse::<Address>()
            .map_err(|_| ScriptError::UnknownParty(party.to_string()))
    }

    pub fn key(&self, party: &str) -> Result<&PrivateKeySigner, ScriptError> {
        self.keys
            .get(party)
            .map(|key| &**key)
            .ok_or_else(|| ScriptError::MissingKey(party.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    #[serde(flatten)]
    pub step: Step,
    /// The step is expected to be rejected by the escrow.
    #[serde(default)]
    pub expect_failure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Step {
    /// Credits token balance out of thin air.
    Mint { to: String, amount: U256 },
    /// Lets the escrow pull `amount` from `owner`.
    Approve { owner: String, amount: U256 },
    ApproveAll,
    Deposit {
        sender: String,
        receiver: String,
        amount: U256,
    },
    DepositMany {
        sender: String,
        receivers: Vec<String>,
        amounts: Vec<U256>,
    },
    Thaw {
        sender: String,
        receiver: String,
        amount: U256,
    },
    CancelThaw { sender: String, receiver: String },
    Withdraw { sender: String, receiver: String },
    AuthorizeSigner {
        sender: String,
        signer: String,
        #[serde(default)]
        proof: Option<Bytes>,
    },
    ThawSigner { sender: String, signer: String },
    CancelThawSigner { sender: String, signer: String },
    RevokeAuthorizedSigner { sender: String, signer: String },
    Redeem {
        receiver: String,
        /// Signs the voucher unless `signature` is given.
        #[serde(default)]
        signer: Option<String>,
        allocation: String,
        #[serde(default)]
        timestamp_ns: u64,
        /// Decimal or `0x` hex string; must fit in `uint128`.
        value_aggregate: U256,
        #[serde(default)]
        signature: Option<Bytes>,
        #[serde(default)]
        allocation_proof: Option<Bytes>,
    },
    AdvanceTime { seconds: u64 },
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::Mint { .. } => "mint",
            Step::Approve { .. } => "approve",
            Step::ApproveAll => "approveAll",
            Step::Deposit { .. } => "deposit",
            Step::DepositMany { .. } => "depositMany",
            Step::Thaw { .. } => "thaw",
            Step::CancelThaw { .. } => "cancelThaw",
            Step::Withdraw { .. } => "withdraw",
            Step::AuthorizeSigner { .. } => "authorizeSigner",
            Step::ThawSigner { .. } => "thawSigner",
            Step::CancelThawSigner { .. } => "cancelThawSigner",
            Step::RevokeAuthorizedSigner { .. } => "revokeAuthorizedSigner",
            Step::Redeem { .. } => "redeem",
            Step::AdvanceTime { .. } => "advanceTime",
        }
    }
}
