//! Collateral accounts and the thaw/withdraw cycle.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use std::collections::HashMap;
use tap_types::timestamp::UnixTimestamp;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::CollateralEscrow;
use crate::clock::Clock;
use crate::collaborators::{CollectionSink, ValueTransfer};
use crate::error::EscrowError;
use crate::events::EscrowEvent;

/// Withdrawal notice state of a collateral account.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ThawState {
    #[default]
    Idle,
    /// `amount` has been requested for withdrawal, possible from `thaw_end` on.
    Thawing {
        amount: U256,
        thaw_end: UnixTimestamp,
    },
}

/// Collateral a sender holds for one receiver.
///
/// `amount_thawing() <= balance` does not always hold: a redemption may shrink the
/// balance below an earlier thaw request. Withdrawal clamps to the balance.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollateralAccount {
    pub balance: U256,
    pub thaw: ThawState,
}

impl CollateralAccount {
    pub fn amount_thawing(&self) -> U256 {
        match self.thaw {
            ThawState::Idle => U256::ZERO,
            ThawState::Thawing { amount, .. } => amount,
        }
    }

    pub fn thaw_end(&self) -> Option<UnixTimestamp> {
        match self.thaw {
            ThawState::Idle => None,
            ThawState::Thawing { thaw_end, .. } => Some(thaw_end),
        }
    }
}

impl<T, S, C> CollateralEscrow<T, S, C>
where
    T: ValueTransfer,
    S: CollectionSink,
    C: Clock,
{
    pub fn get_escrow_amount(&self, sender: Address, receiver: Address) -> U256 {
        self.accounts
            .get(&(sender, receiver))
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    /// The account of `sender` for `receiver`, or an empty account if none exists.
    pub fn get_escrow_account(&self, sender: Address, receiver: Address) -> CollateralAccount {
        self.accounts
            .get(&(sender, receiver))
            .cloned()
            .unwrap_or_default()
    }

    /// Credits `amount` to the caller's account for `receiver`, pulling the value from
    /// the caller.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub async fn deposit(
        &mut self,
        caller: Address,
        receiver: Address,
        amount: U256,
    ) -> Result<(), EscrowError> {
        let balance = self
            .get_escrow_amount(caller, receiver)
            .checked_add(amount)
            .ok_or(EscrowError::ArithmeticOverflow)?;
        self.token.pull(caller, amount).await?;

        self.accounts.entry((caller, receiver)).or_default().balance = balance;
        self.emit(EscrowEvent::Deposit {
            sender: caller,
            receiver,
            amount,
        });
        Ok(())
    }

    /// Deposits to several receivers with a single pull of the total.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(caller = %caller, receivers = receivers.len())))]
    pub async fn deposit_many(
        &mut self,
        caller: Address,
        receivers: &[Address],
        amounts: &[U256],
    ) -> Result<(), EscrowError> {
        if receivers.len() != amounts.len() {
            return Err(EscrowError::InputsLengthMismatch {
                receivers: receivers.len(),
                amounts: amounts.len(),
            });
        }
        let mut balances: HashMap<Address, U256> = HashMap::new();
        let mut total = U256::ZERO;
        for (&receiver, &amount) in receivers.iter().zip(amounts) {
            let current = match balances.get(&receiver) {
                Some(balance) => *balance,
                None => self.get_escrow_amount(caller, receiver),
            };
            let balance = current
                .checked_add(amount)
                .ok_or(EscrowError::ArithmeticOverflow)?;
            balances.insert(receiver, balance);
            total = total
                .checked_add(amount)
                .ok_or(EscrowError::ArithmeticOverflow)?;
        }
        self.token.pull(caller, total).await?;

        for (receiver, balance) in balances {
            self.accounts.entry((caller, receiver)).or_default().balance = balance;
        }
        for (&receiver, &amount) in receivers.iter().zip(amounts) {
            self.emit(EscrowEvent::Deposit {
                sender: caller,
                receiver,
                amount,
            });
        }
        Ok(())
    }

    /// Requests `amount` more of the caller's collateral for `receiver` to be withdrawn,
    /// restarting the thawing period.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub fn thaw(
        &mut self,
        caller: Address,
        receiver: Address,
        amount: U256,
    ) -> Result<(), EscrowError> {
        let account = self.get_escrow_account(caller, receiver);
        let total_amount_thawing = account
            .amount_thawing()
            .checked_add(amount)
            .ok_or(EscrowError::ArithmeticOverflow)?;
        if total_amount_thawing > account.balance {
            return Err(EscrowError::InsufficientCollateral {
                available: account.balance,
                required: total_amount_thawing,
            });
        }
        let thaw_end = self
            .clock
            .now()
            .checked_add_secs(self.config.withdraw_escrow_thawing_period)
            .ok_or(EscrowError::ArithmeticOverflow)?;

        self.accounts.entry((caller, receiver)).or_default().thaw = ThawState::Thawing {
            amount: total_amount_thawing,
            thaw_end,
        };
        self.emit(EscrowEvent::Thaw {
            sender: caller,
            receiver,
            amount,
            total_amount_thawing,
            thaw_end_timestamp: thaw_end,
        });
        Ok(())
    }

    /// Abandons a pending thaw; the collateral stays in escrow.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub fn cancel_thaw(&mut self, caller: Address, receiver: Address) -> Result<(), EscrowError> {
        let account = self
            .accounts
            .get_mut(&(caller, receiver))
            .filter(|account| account.thaw != ThawState::Idle)
            .ok_or(EscrowError::CollateralNotThawing)?;
        account.thaw = ThawState::Idle;
        self.emit(EscrowEvent::CancelThaw {
            sender: caller,
            receiver,
        });
        Ok(())
    }

    /// Withdraws thawed collateral to the caller once the thawing period has elapsed.
    ///
    /// Pays `min(amount_thawing, balance)` and returns it.
    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    pub async fn withdraw(
        &mut self,
        caller: Address,
        receiver: Address,
    ) -> Result<U256, EscrowError> {
        let account = self.get_escrow_account(caller, receiver);
        let (amount_thawing, thaw_end) = match account.thaw {
            ThawState::Idle => return Err(EscrowError::CollateralNotThawing),
            ThawState::Thawing { amount, thaw_end } => (amount, thaw_end),
        };
        let current_time = self.clock.now();
        if current_time < thaw_end {
            return Err(EscrowError::CollateralStillThawing {
                current_time,
                thaw_end,
            });
        }
        let amount = amount_thawing.min(account.balance);
        self.token.push(caller, amount).await?;

        let account = self.accounts.entry((caller, receiver)).or_default();
        account.balance -= amount;
        account.thaw = ThawState::Idle;
        self.emit(EscrowEvent::Withdraw {
            sender: caller,
            receiver,
            amount,
        });
        Ok(amount)
    }
}
