//! Token Collaborator
//!
//! The pool never owns token balances directly. Transfers of the debt token
//! and of collateral go through a [`TokenLedger`] supplied by the host.
//!
//! Implementations are `Clone`: the pool runs an operation's transfers on a
//! copy and keeps the copy only when every transfer succeeded.
//!
//! [`InMemoryTokenLedger`] backs tests and simulations.

use bold_common::{
    errors::{BoldError, BoldResult},
    types::{Address, Amount},
    validation::require_sufficient_balance,
    BTreeMap,
};

/// Token movements the Stability Pool asks of its environment
pub trait TokenLedger: Clone {
    /// Move debt tokens from a depositor into the pool
    fn send_to_pool(&mut self, from: &Address, amount: Amount) -> BoldResult<()>;

    /// Move debt tokens from the pool back to a depositor
    fn return_from_pool(&mut self, to: &Address, amount: Amount) -> BoldResult<()>;

    /// Burn debt tokens held by the pool
    fn burn_from_pool(&mut self, amount: Amount) -> BoldResult<()>;

    /// Move liquidated collateral from the active pool into the pool
    fn pull_collateral_from_active_pool(&mut self, amount: Amount) -> BoldResult<()>;

    /// Move collateral from the pool to a depositor
    fn send_collateral(&mut self, to: &Address, amount: Amount) -> BoldResult<()>;
}

/// Balance book for tests and simulations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryTokenLedger {
    debt_balances: BTreeMap<Address, Amount>,
    coll_balances: BTreeMap<Address, Amount>,
    pool_debt: Amount,
    pool_coll: Amount,
    active_pool_coll: Amount,
    total_burned: Amount,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Funding ============

    /// Credit debt tokens to an account
    pub fn mint(&mut self, to: &Address, amount: Amount) {
        let balance = self.debt_balances.entry(*to).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Credit freshly minted yield straight to the pool
    pub fn mint_to_pool(&mut self, amount: Amount) {
        self.pool_debt = self.pool_debt.saturating_add(amount);
    }

    /// Credit collateral to the active pool, ready to be liquidated
    pub fn fund_active_pool(&mut self, amount: Amount) {
        self.active_pool_coll = self.active_pool_coll.saturating_add(amount);
    }

    // ============ Reads ============

    pub fn debt_balance_of(&self, account: &Address) -> Amount {
        self.debt_balances.get(account).copied().unwrap_or(0)
    }

    pub fn collateral_balance_of(&self, account: &Address) -> Amount {
        self.coll_balances.get(account).copied().unwrap_or(0)
    }

    pub fn pool_debt_balance(&self) -> Amount {
        self.pool_debt
    }

    pub fn pool_collateral_balance(&self) -> Amount {
        self.pool_coll
    }

    pub fn active_pool_collateral(&self) -> Amount {
        self.active_pool_coll
    }

    pub fn total_burned(&self) -> Amount {
        self.total_burned
    }
}

fn credit(balances: &mut BTreeMap<Address, Amount>, to: &Address, amount: Amount) -> BoldResult<()> {
    let balance = balances.entry(*to).or_insert(0);
    *balance = balance.checked_add(amount).ok_or(BoldError::Overflow)?;
    Ok(())
}

impl TokenLedger for InMemoryTokenLedger {
    fn send_to_pool(&mut self, from: &Address, amount: Amount) -> BoldResult<()> {
        let available = self.debt_balance_of(from);
        require_sufficient_balance(available, amount)?;
        let pool_debt = self.pool_debt.checked_add(amount).ok_or(BoldError::Overflow)?;

        self.debt_balances.insert(*from, available - amount);
        self.pool_debt = pool_debt;
        Ok(())
    }

    fn return_from_pool(&mut self, to: &Address, amount: Amount) -> BoldResult<()> {
        require_sufficient_balance(self.pool_debt, amount)?;
        credit(&mut self.debt_balances, to, amount)?;
        self.pool_debt -= amount;
        Ok(())
    }

    fn burn_from_pool(&mut self, amount: Amount) -> BoldResult<()> {
        require_sufficient_balance(self.pool_debt, amount)?;
        self.pool_debt -= amount;
        self.total_burned = self.total_burned.saturating_add(amount);
        Ok(())
    }

    fn pull_collateral_from_active_pool(&mut self, amount: Amount) -> BoldResult<()> {
        require_sufficient_balance(self.active_pool_coll, amount)?;
        self.pool_coll = self.pool_coll.checked_add(amount).ok_or(BoldError::Overflow)?;
        self.active_pool_coll -= amount;
        Ok(())
    }

    fn send_collateral(&mut self, to: &Address, amount: Amount) -> BoldResult<()> {
        require_sufficient_balance(self.pool_coll, amount)?;
        credit(&mut self.coll_balances, to, amount)?;
        self.pool_coll -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: Address = [7u8; 32];

    #[test]
    fn test_deposit_and_return_round_trip() {
        let mut tokens = InMemoryTokenLedger::new();
        tokens.mint(&USER, 100);

        tokens.send_to_pool(&USER, 60).unwrap();
        assert_eq!(tokens.debt_balance_of(&USER), 40);
        assert_eq!(tokens.pool_debt_balance(), 60);

        tokens.return_from_pool(&USER, 60).unwrap();
        assert_eq!(tokens.debt_balance_of(&USER), 100);
        assert_eq!(tokens.pool_debt_balance(), 0);
    }

    #[test]
    fn test_send_to_pool_requires_balance() {
        let mut tokens = InMemoryTokenLedger::new();
        tokens.mint(&USER, 10);

        let result = tokens.send_to_pool(&USER, 11);

        assert_eq!(
            result,
            Err(BoldError::InsufficientBalance { available: 10, requested: 11 })
        );
        assert_eq!(tokens.debt_balance_of(&USER), 10);
    }

    #[test]
    fn test_collateral_flow() {
        let mut tokens = InMemoryTokenLedger::new();
        tokens.fund_active_pool(5);

        tokens.pull_collateral_from_active_pool(5).unwrap();
        tokens.send_collateral(&USER, 3).unwrap();

        assert_eq!(tokens.active_pool_collateral(), 0);
        assert_eq!(tokens.pool_collateral_balance(), 2);
        assert_eq!(tokens.collateral_balance_of(&USER), 3);
        assert!(tokens.send_collateral(&USER, 3).is_err());
    }

    #[test]
    fn test_burn_from_pool() {
        let mut tokens = InMemoryTokenLedger::new();
        tokens.mint_to_pool(50);

        tokens.burn_from_pool(20).unwrap();

        assert_eq!(tokens.pool_debt_balance(), 30);
        assert_eq!(tokens.total_burned(), 20);
        assert!(tokens.burn_from_pool(31).is_err());
    }
}
