//! Replays a script against a fresh escrow.

use alloy_primitives::{Address, Bytes, U256};
use clap::Parser;
use dotenvy::dotenv;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tap_escrow::client::{sign_allocation_proof, sign_rav, sign_signer_proof};
use tap_escrow::{
    Clock, CollateralAccount, CollateralEscrow, EscrowEvent, EscrowToken, InMemoryStaking,
    InMemoryToken, ManualClock, SignerAuthorization,
};
use tap_types::timestamp::UnixTimestamp;
use tap_verifier::{ReceiptAggregateVoucher, SignedRav};

use crate::config::{CliArgs, Config, load_json};
use crate::script::{Script, ScriptError, ScriptStep, Step, voucher_value};
use crate::telemetry::Telemetry;

type Escrow = CollateralEscrow<EscrowToken, InMemoryStaking, ManualClock>;

/// Loads the configuration and the script, replays the script and prints the report.
///
/// Fails if any step's outcome differs from its `expectFailure` flag.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let _telemetry = Telemetry::init()?;

    let args = CliArgs::parse();
    let config = Config::load(&args.config)?;
    let script: Script = load_json(&args.script)?;

    let mut simulation = Simulation::new(&config, &script)?;
    for (index, step) in script.steps.iter().enumerate() {
        simulation.apply(index, step).await;
    }
    let report = simulation.report().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let unexpected = report.steps.iter().filter(|step| !step.as_expected).count();
    if unexpected > 0 {
        return Err(format!("{unexpected} step(s) did not go as expected").into());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    pub as_expected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountReport {
    pub sender: Address,
    pub receiver: Address,
    #[serde(flatten)]
    pub account: CollateralAccount,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerReport {
    pub signer: Address,
    #[serde(flatten)]
    pub authorization: SignerAuthorization,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub end_time: UnixTimestamp,
    pub steps: Vec<StepOutcome>,
    pub events: Vec<EscrowEvent>,
    pub accounts: Vec<AccountReport>,
    pub signers: Vec<SignerReport>,
    pub token_balances: BTreeMap<String, U256>,
}

struct Simulation<'a> {
    script: &'a Script,
    escrow: Escrow,
    token: InMemoryToken,
    clock: ManualClock,
    outcomes: Vec<StepOutcome>,
    pairs: BTreeSet<(Address, Address)>,
    signers: BTreeSet<Address>,
}

impl<'a> Simulation<'a> {
    fn new(config: &Config, script: &'a Script) -> Result<Self, tap_escrow::ConfigError> {
        let escrow_config = config.escrow_config();
        let token = InMemoryToken::new();
        let staking =
            InMemoryStaking::new(escrow_config.staking, escrow_config.escrow, token.clone());
        let clock = ManualClock::new(config.start_time());
        let escrow = CollateralEscrow::new(
            escrow_config.clone(),
            token.for_escrow(escrow_config.escrow),
            staking,
            clock.clone(),
        )?;
        Ok(Self {
            script,
            escrow,
            token,
            clock,
            outcomes: Vec::new(),
            pairs: BTreeSet::new(),
            signers: BTreeSet::new(),
        })
    }

    async fn apply(&mut self, index: usize, step: &ScriptStep) {
        let op = step.step.op();
        let result = self.execute(&step.step).await;
        let as_expected = result.is_err() == step.expect_failure;
        match &result {
            Ok(()) => tracing::info!(index, op, "step applied"),
            Err(e) if as_expected => tracing::info!(index, op, error = %e, "step rejected as expected"),
            Err(e) => tracing::warn!(index, op, error = %e, "step rejected"),
        }
        if !as_expected && result.is_ok() {
            tracing::warn!(index, op, "step was expected to fail");
        }
        self.outcomes.push(StepOutcome {
            index,
            op,
            as_expected,
            error: result.err().map(|e| e.to_string()),
        });
    }

    async fn execute(&mut self, step: &Step) -> Result<(), ScriptError> {
        let script = self.script;
        match step {
            Step::Mint { to, amount } => {
                self.token.mint(script.address_of(to)?, *amount).await?;
            }
            Step::Approve { owner, amount } => {
                let escrow = self.escrow.config().escrow;
                self.token
                    .approve(script.address_of(owner)?, escrow, *amount)
                    .await;
            }
            Step::ApproveAll => self.escrow.approve_all().await?,
            Step::Deposit {
                sender,
                receiver,
                amount,
            } => {
                let (sender, receiver) = self.pair(sender, receiver)?;
                self.escrow.deposit(sender, receiver, *amount).await?;
            }
            Step::DepositMany {
                sender,
                receivers,
                amounts,
            } => {
                let sender = script.address_of(sender)?;
                let receivers = receivers
                    .iter()
                    .map(|receiver| script.address_of(receiver))
                    .collect::<Result<Vec<_>, _>>()?;
                self.pairs
                    .extend(receivers.iter().map(|&receiver| (sender, receiver)));
                self.escrow.deposit_many(sender, &receivers, amounts).await?;
            }
            Step::Thaw {
                sender,
                receiver,
                amount,
            } => {
                let (sender, receiver) = self.pair(sender, receiver)?;
                self.escrow.thaw(sender, receiver, *amount)?;
            }
            Step::CancelThaw { sender, receiver } => {
                let (sender, receiver) = self.pair(sender, receiver)?;
                self.escrow.cancel_thaw(sender, receiver)?;
            }
            Step::Withdraw { sender, receiver } => {
                let (sender, receiver) = self.pair(sender, receiver)?;
                let amount = self.escrow.withdraw(sender, receiver).await?;
                tracing::debug!(%amount, "withdrawn");
            }
            Step::AuthorizeSigner {
                sender,
                signer,
                proof,
            } => {
                let sender = script.address_of(sender)?;
                let signer_address = script.address_of(signer)?;
                self.signers.insert(signer_address);
                let proof = match proof {
                    Some(proof) => proof.clone(),
                    None => {
                        let config = self.escrow.config();
                        sign_signer_proof(script.key(signer)?, config.chain_id, config.escrow, sender)
                            .await?
                    }
                };
                self.escrow.authorize_signer(sender, signer_address, &proof)?;
            }
            Step::ThawSigner { sender, signer } => {
                let (sender, signer) = (script.address_of(sender)?, script.address_of(signer)?);
                self.escrow.thaw_signer(sender, signer)?;
            }
            Step::CancelThawSigner { sender, signer } => {
                let (sender, signer) = (script.address_of(sender)?, script.address_of(signer)?);
                self.escrow.cancel_thaw_signer(sender, signer)?;
            }
            Step::RevokeAuthorizedSigner { sender, signer } => {
                let (sender, signer) = (script.address_of(sender)?, script.address_of(signer)?);
                self.escrow.revoke_authorized_signer(sender, signer)?;
            }
            Step::Redeem {
                receiver,
                signer,
                allocation,
                timestamp_ns,
                value_aggregate,
                signature,
                allocation_proof,
            } => {
                let receiver = script.address_of(receiver)?;
                let allocation_id = script.address_of(allocation)?;
                let message = ReceiptAggregateVoucher {
                    allocationId: allocation_id,
                    timestampNs: *timestamp_ns,
                    valueAggregate: voucher_value(*value_aggregate)?,
                };
                let signed_rav = match (signature, signer) {
                    (Some(signature), _) => SignedRav {
                        message,
                        signature: signature.clone(),
                    },
                    (None, Some(signer)) => {
                        sign_rav(script.key(signer)?, self.escrow.verifier(), message).await?
                    }
                    (None, None) => return Err(ScriptError::MissingKey("signer".to_string())),
                };
                let allocation_proof: Bytes = match allocation_proof {
                    Some(proof) => proof.clone(),
                    None => {
                        let config = self.escrow.config();
                        let sender = self
                            .escrow
                            .verifier()
                            .recover_signer(&signed_rav)
                            .ok()
                            .and_then(|signer| self.escrow.authorized_signer(signer))
                            .map(|authorization| authorization.sender)
                            .unwrap_or_default();
                        sign_allocation_proof(
                            script.key(allocation)?,
                            config.chain_id,
                            config.allocation_tracker,
                            sender,
                        )
                        .await?
                    }
                };
                let redemption = self
                    .escrow
                    .redeem(receiver, &signed_rav, &allocation_proof)
                    .await?;
                self.pairs.insert((redemption.sender, receiver));
            }
            Step::AdvanceTime { seconds } => {
                let now = self.clock.advance(*seconds);
                tracing::debug!(%now, "time advanced");
            }
        }
        Ok(())
    }

    fn pair(&mut self, sender: &str, receiver: &str) -> Result<(Address, Address), ScriptError> {
        let pair = (
            self.script.address_of(sender)?,
            self.script.address_of(receiver)?,
        );
        self.pairs.insert(pair);
        Ok(pair)
    }

    async fn report(self) -> Report {
        let accounts = self
            .pairs
            .iter()
            .map(|&(sender, receiver)| AccountReport {
                sender,
                receiver,
                account: self.escrow.get_escrow_account(sender, receiver),
            })
            .collect();
        let signers = self
            .signers
            .iter()
            .filter_map(|&signer| {
                self.escrow
                    .authorized_signer(signer)
                    .map(|authorization| SignerReport {
                        signer,
                        authorization: *authorization,
                    })
            })
            .collect();

        let config = self.escrow.config();
        let mut holders: Vec<(String, Address)> = self
            .script
            .keys
            .iter()
            .map(|(name, key)| (name.clone(), key.address()))
            .collect();
        holders.push(("escrow".to_string(), config.escrow));
        holders.push(("staking".to_string(), config.staking));
        let mut token_balances = BTreeMap::new();
        for (name, address) in holders {
            token_balances.insert(name, self.token.balance_of(address).await);
        }

        Report {
            end_time: self.clock.now(),
            steps: self.outcomes,
            events: self.escrow.events().to_vec(),
            accounts,
            signers,
            token_balances,
        }
    }
}
