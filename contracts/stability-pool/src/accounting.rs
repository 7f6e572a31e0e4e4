//! Pool Accounting
//!
//! Aggregate counters of the pool, updated incrementally by every
//! operation. Operations mutate a copy and only write it back once every
//! step has succeeded.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use bold_common::{
    errors::{BoldError, BoldResult, InvariantViolation},
    types::Amount,
};

/// Running totals of the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolAccounting {
    /// Debt tokens deposited, net of offsets
    total_deposits: Amount,
    /// Collateral held for depositors, stashed or not
    coll_balance: Amount,
    /// Yield received but not yet compounded or paid out
    yield_gains_owed: Amount,
}

fn add(counter: Amount, amount: Amount) -> BoldResult<Amount> {
    counter
        .checked_add(amount)
        .ok_or(BoldError::ArithmeticInvariantViolation {
            reason: InvariantViolation::CounterOverflow,
        })
}

fn sub(counter: Amount, amount: Amount) -> BoldResult<Amount> {
    counter
        .checked_sub(amount)
        .ok_or(BoldError::ArithmeticInvariantViolation {
            reason: InvariantViolation::CounterUnderflow,
        })
}

impl PoolAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_deposits(&self) -> Amount {
        self.total_deposits
    }

    pub fn coll_balance(&self) -> Amount {
        self.coll_balance
    }

    pub fn yield_gains_owed(&self) -> Amount {
        self.yield_gains_owed
    }

    pub fn increase_total_deposits(&mut self, amount: Amount) -> BoldResult<()> {
        self.total_deposits = add(self.total_deposits, amount)?;
        Ok(())
    }

    pub fn decrease_total_deposits(&mut self, amount: Amount) -> BoldResult<()> {
        self.total_deposits = sub(self.total_deposits, amount)?;
        Ok(())
    }

    pub fn increase_coll_balance(&mut self, amount: Amount) -> BoldResult<()> {
        self.coll_balance = add(self.coll_balance, amount)?;
        Ok(())
    }

    pub fn decrease_coll_balance(&mut self, amount: Amount) -> BoldResult<()> {
        self.coll_balance = sub(self.coll_balance, amount)?;
        Ok(())
    }

    pub fn increase_yield_gains_owed(&mut self, amount: Amount) -> BoldResult<()> {
        self.yield_gains_owed = add(self.yield_gains_owed, amount)?;
        Ok(())
    }

    pub fn decrease_yield_gains_owed(&mut self, amount: Amount) -> BoldResult<()> {
        self.yield_gains_owed = sub(self.yield_gains_owed, amount)?;
        Ok(())
    }
}
