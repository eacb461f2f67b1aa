use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{TransferError, ValueTransfer};

#[derive(Debug, Default)]
struct TokenLedger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl TokenLedger {
    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TransferError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TransferError::InsufficientBalance {
                account: from,
                available: from_balance,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow(to))?;
        self.balances.insert(from, from_balance - amount);
        self.balances.insert(to, to_balance);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(TransferError::InsufficientAllowance {
                owner: from,
                spender,
                available: allowance,
                required: amount,
            });
        }
        self.transfer(from, to, amount)?;
        // An unlimited approval is never drawn down.
        if allowance != U256::MAX {
            self.allowances.insert((from, spender), allowance - amount);
        }
        Ok(())
    }
}

/// An ERC-20-like token kept in memory. Clones share the same balances.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToken {
    ledger: Arc<Mutex<TokenLedger>>,
}

impl InMemoryToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mint(&self, to: Address, amount: U256) -> Result<(), TransferError> {
        let mut ledger = self.ledger.lock().await;
        let balance = ledger
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow(to))?;
        ledger.balances.insert(to, balance);
        Ok(())
    }

    pub async fn balance_of(&self, account: Address) -> U256 {
        self.ledger.lock().await.balance_of(account)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.ledger.lock().await.allowance(owner, spender)
    }

    pub async fn approve(&self, owner: Address, spender: Address, amount: U256) {
        self.ledger
            .lock()
            .await
            .allowances
            .insert((owner, spender), amount);
    }

    pub async fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        self.ledger.lock().await.transfer(from, to, amount)
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    pub async fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        self.ledger
            .lock()
            .await
            .transfer_from(spender, from, to, amount)
    }

    /// The view of this token held by the escrow deployed at `escrow`.
    pub fn for_escrow(&self, escrow: Address) -> EscrowToken {
        EscrowToken {
            token: self.clone(),
            escrow,
        }
    }
}

/// [`InMemoryToken`] bound to the escrow's address.
#[derive(Debug, Clone)]
pub struct EscrowToken {
    token: InMemoryToken,
    escrow: Address,
}

impl EscrowToken {
    pub fn token(&self) -> &InMemoryToken {
        &self.token
    }

    pub fn escrow(&self) -> Address {
        self.escrow
    }
}

#[async_trait]
impl ValueTransfer for EscrowToken {
    async fn pull(&self, from: Address, amount: U256) -> Result<(), TransferError> {
        self.token
            .transfer_from(self.escrow, from, self.escrow, amount)
            .await
    }

    async fn push(&self, to: Address, amount: U256) -> Result<(), TransferError> {
        self.token.transfer(self.escrow, to, amount).await
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<(), TransferError> {
        self.token.approve(self.escrow, spender, amount).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ESCROW: Address = address!("0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");
    const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

    #[tokio::test]
    async fn test_pull_requires_allowance() {
        let token = InMemoryToken::new();
        token.mint(ALICE, U256::from(100)).await.unwrap();
        let escrow = token.for_escrow(ESCROW);

        let err = escrow.pull(ALICE, U256::from(10)).await.unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientAllowance {
                owner: ALICE,
                spender: ESCROW,
                available: U256::ZERO,
                required: U256::from(10),
            }
        );

        token.approve(ALICE, ESCROW, U256::from(50)).await;
        escrow.pull(ALICE, U256::from(10)).await.unwrap();
        assert_eq!(token.balance_of(ALICE).await, U256::from(90));
        assert_eq!(token.balance_of(ESCROW).await, U256::from(10));
        assert_eq!(token.allowance(ALICE, ESCROW).await, U256::from(40));
    }

    #[tokio::test]
    async fn test_failed_pull_changes_nothing() {
        let token = InMemoryToken::new();
        token.mint(ALICE, U256::from(5)).await.unwrap();
        token.approve(ALICE, ESCROW, U256::from(50)).await;
        let escrow = token.for_escrow(ESCROW);

        let err = escrow.pull(ALICE, U256::from(10)).await.unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { .. }));
        assert_eq!(token.balance_of(ALICE).await, U256::from(5));
        assert_eq!(token.allowance(ALICE, ESCROW).await, U256::from(50));
    }

    #[tokio::test]
    async fn test_unlimited_allowance_is_not_drawn_down() {
        let token = InMemoryToken::new();
        token.mint(ESCROW, U256::from(100)).await.unwrap();
        let escrow = token.for_escrow(ESCROW);
        escrow.approve(BOB, U256::MAX).await.unwrap();
        token
            .transfer_from(BOB, ESCROW, BOB, U256::from(60))
            .await
            .unwrap();
        assert_eq!(token.allowance(ESCROW, BOB).await, U256::MAX);
        assert_eq!(token.balance_of(BOB).await, U256::from(60));
    }

    #[tokio::test]
    async fn test_push_from_escrow() {
        let token = InMemoryToken::new();
        token.mint(ESCROW, U256::from(100)).await.unwrap();
        let escrow = token.for_escrow(ESCROW);
        escrow.push(ALICE, U256::from(30)).await.unwrap();
        assert_eq!(token.balance_of(ALICE).await, U256::from(30));
        assert!(escrow.push(ALICE, U256::from(71)).await.is_err());
    }

    #[tokio::test]
    async fn test_mint_overflow() {
        let token = InMemoryToken::new();
        token.mint(ALICE, U256::MAX).await.unwrap();
        assert_eq!(
            token.mint(ALICE, U256::from(1)).await,
            Err(TransferError::BalanceOverflow(ALICE))
        );
    }
}
