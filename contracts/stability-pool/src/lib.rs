//! Stability Pool Contract
//!
//! First line of defense for a BOLD collateral branch.
//! Depositors lock BOLD, absorb liquidated debt pro rata, and in return earn
//! the liquidated collateral plus the interest yield minted by the branch.
//!
//! ## Operations
//!
//! - **provide_to_sp**: top up a deposit, compounding or claiming pending gains
//! - **withdraw_from_sp**: withdraw up to the compounded deposit
//! - **claim_all_collateral_gains**: collect stashed collateral once the deposit is gone
//! - **offset**: absorb liquidated debt (liquidation engine only)
//! - **trigger_yield**: attribute minted interest (interest engine only)
//!
//! Every operation stages its changes, performs token transfers on a copy of
//! the [`TokenLedger`], and only then commits both. A failed operation leaves
//! the pool and its token balances untouched.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use bold_common::{
    check,
    deposits::DepositRegistry,
    errors::{BoldError, BoldResult},
    events::{BoldEvent, DepositOperationKind, EventLog},
    ledger::FixedPointLedger,
    types::{Address, Amount, AppId, StabilityPoolAction},
    validation::{require_positive, require_valid_address},
    Vec,
};

pub mod accounting;
pub mod offset;
pub mod token;
pub mod witness;
pub mod yield_distribution;

pub use accounting::PoolAccounting;
pub use token::{InMemoryTokenLedger, TokenLedger};
pub use witness::StabilityWitness;

// ============ Stability Pool Config ============

/// Configuration for the Stability Pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StabilityPoolConfig {
    /// BOLD token app_id
    pub debt_token_id: AppId,
    /// Branch collateral app_id
    pub collateral_token_id: AppId,
    /// Liquidation engine app_id (only this can call offset)
    pub liquidation_engine_id: AppId,
    /// Interest engine app_id (only this can trigger yield)
    pub interest_engine_id: AppId,
}

impl StabilityPoolConfig {
    /// Reject configurations with unset identifiers
    pub fn validate(&self) -> BoldResult<()> {
        require_valid_address(self.debt_token_id, "debt token id is zero")?;
        require_valid_address(self.collateral_token_id, "collateral token id is zero")?;
        require_valid_address(self.liquidation_engine_id, "liquidation engine id is zero")?;
        require_valid_address(self.interest_engine_id, "interest engine id is zero")?;
        Ok(())
    }
}

// ============ Depositor Position ============

/// A depositor's state derived against the current ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    initial_value: Amount,
    compounded: Amount,
    coll_gain: Amount,
    yield_gain: Amount,
    stashed_coll: Amount,
}

/// How pending gains are settled by a provide or withdraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settlement {
    kept_yield: Amount,
    yield_sent: Amount,
    new_stash: Amount,
    coll_sent: Amount,
}

impl Settlement {
    fn settled_yield(&self) -> Amount {
        self.kept_yield + self.yield_sent
    }
}

impl Position {
    /// Split pending gains into what stays in the pool and what is paid out.
    ///
    /// Settled yield is clamped to `yield_gains_owed` and paid collateral to
    /// `coll_balance`, so rounding never releases more than the pool holds.
    fn settle(&self, claim: bool, accounting: &PoolAccounting) -> BoldResult<Settlement> {
        let yield_gain = self.yield_gain.min(accounting.yield_gains_owed());
        let total_coll = self
            .stashed_coll
            .checked_add(self.coll_gain)
            .ok_or(BoldError::Overflow)?;

        Ok(if claim {
            Settlement {
                kept_yield: 0,
                yield_sent: yield_gain,
                new_stash: 0,
                coll_sent: total_coll.min(accounting.coll_balance()),
            }
        } else {
            Settlement {
                kept_yield: yield_gain,
                yield_sent: 0,
                new_stash: total_coll,
                coll_sent: 0,
            }
        })
    }

    fn deposit_loss(&self) -> Amount {
        self.initial_value.saturating_sub(self.compounded)
    }
}

fn pay_out<L: TokenLedger>(tokens: &mut L, depositor: &Address, debt: Amount, coll: Amount) -> BoldResult<()> {
    if debt > 0 {
        tokens.return_from_pool(depositor, debt)?;
    }
    if coll > 0 {
        tokens.send_collateral(depositor, coll)?;
    }
    Ok(())
}

// ============ Stability Pool ============

/// One Stability Pool, bound to a single collateral branch
#[derive(Debug, Clone)]
pub struct StabilityPool<L: TokenLedger> {
    config: StabilityPoolConfig,
    ledger: FixedPointLedger,
    registry: DepositRegistry,
    accounting: PoolAccounting,
    tokens: L,
    events: EventLog,
}

impl<L: TokenLedger> StabilityPool<L> {
    /// Create an empty pool
    pub fn new(config: StabilityPoolConfig, tokens: L) -> BoldResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ledger: FixedPointLedger::new(),
            registry: DepositRegistry::new(),
            accounting: PoolAccounting::new(),
            tokens,
            events: EventLog::new(),
        })
    }

    pub fn config(&self) -> &StabilityPoolConfig {
        &self.config
    }

    pub fn ledger(&self) -> &FixedPointLedger {
        &self.ledger
    }

    pub fn registry(&self) -> &DepositRegistry {
        &self.registry
    }

    pub fn accounting(&self) -> &PoolAccounting {
        &self.accounting
    }

    pub fn tokens(&self) -> &L {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut L {
        &mut self.tokens
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drain the events emitted so far
    pub fn take_events(&mut self) -> Vec<BoldEvent> {
        core::mem::take(&mut self.events).into_events()
    }

    // ============ Dispatch ============

    /// Execute an action on behalf of `caller`.
    ///
    /// For depositor actions the caller is the depositor; for offsets and
    /// yield it must be the configured collaborator.
    pub fn execute(&mut self, caller: AppId, action: &StabilityPoolAction) -> BoldResult<()> {
        match action {
            StabilityPoolAction::Provide { amount, claim } => {
                self.provide_to_sp(&caller, *amount, *claim)
            }
            StabilityPoolAction::Withdraw { amount, claim } => {
                self.withdraw_from_sp(&caller, *amount, *claim)
            }
            StabilityPoolAction::ClaimAllCollateral => self.claim_all_collateral_gains(&caller),
            StabilityPoolAction::Offset { debt, collateral } => {
                self.offset(caller, *debt, *collateral).map(|_| ())
            }
            StabilityPoolAction::DistributeYield { amount } => {
                self.trigger_yield(caller, *amount).map(|_| ())
            }
        }
    }

    // ============ Depositor Operations ============

    /// Add `top_up` to a deposit.
    ///
    /// Pending yield is compounded into the deposit and collateral gains are
    /// stashed, unless `claim` is set, in which case both are paid out.
    pub fn provide_to_sp(&mut self, depositor: &Address, top_up: Amount, claim: bool) -> BoldResult<()> {
        // 1. Amount must be positive
        require_positive(top_up)?;

        // 2. Derive the position from the old snapshot
        let position = self.position(depositor)?;
        let settlement = position.settle(claim, &self.accounting)?;

        let new_deposit = position
            .compounded
            .checked_add(top_up)
            .and_then(|v| v.checked_add(settlement.kept_yield))
            .ok_or(BoldError::Overflow)?;

        // 3. Stage aggregate updates
        let mut accounting = self.accounting;
        accounting.increase_total_deposits(top_up)?;
        accounting.increase_total_deposits(settlement.kept_yield)?;
        accounting.decrease_yield_gains_owed(settlement.settled_yield())?;
        accounting.decrease_coll_balance(settlement.coll_sent)?;

        // 4. Move tokens on a staged copy
        let mut tokens = self.tokens.clone();
        tokens.send_to_pool(depositor, top_up)?;
        pay_out(&mut tokens, depositor, settlement.yield_sent, settlement.coll_sent)?;

        // 5. Commit
        self.tokens = tokens;
        self.accounting = accounting;
        self.registry
            .update_deposit_and_snapshots(depositor, new_deposit, settlement.new_stash, &self.ledger);

        log::debug!("provide: top_up={} new_deposit={}", top_up, new_deposit);
        self.emit_deposit_operation(
            depositor,
            DepositOperationKind::Provide,
            &position,
            &settlement,
            top_up,
            0,
        );
        self.emit_deposit_updated(depositor, new_deposit, settlement.new_stash);

        Ok(())
    }

    /// Withdraw up to `requested` from a deposit.
    ///
    /// Requests above the compounded deposit are capped to it, so a large
    /// sentinel withdraws everything.
    pub fn withdraw_from_sp(&mut self, depositor: &Address, requested: Amount, claim: bool) -> BoldResult<()> {
        // 1. Must have a deposit
        let position = self.position(depositor)?;
        check!(
            position.initial_value != 0,
            BoldError::NoDeposit { depositor: *depositor }
        );

        // 2. Cap to the compounded deposit
        let settlement = position.settle(claim, &self.accounting)?;
        let to_withdraw = requested.min(position.compounded);
        let new_deposit = (position.compounded - to_withdraw)
            .checked_add(settlement.kept_yield)
            .ok_or(BoldError::Overflow)?;

        // 3. Stage aggregate updates
        let mut accounting = self.accounting;
        accounting.increase_total_deposits(settlement.kept_yield)?;
        accounting.decrease_total_deposits(to_withdraw)?;
        accounting.decrease_yield_gains_owed(settlement.settled_yield())?;
        accounting.decrease_coll_balance(settlement.coll_sent)?;

        let debt_sent = to_withdraw
            .checked_add(settlement.yield_sent)
            .ok_or(BoldError::Overflow)?;

        // 4. Move tokens on a staged copy
        let mut tokens = self.tokens.clone();
        pay_out(&mut tokens, depositor, debt_sent, settlement.coll_sent)?;

        // 5. Commit
        self.tokens = tokens;
        self.accounting = accounting;
        self.registry
            .update_deposit_and_snapshots(depositor, new_deposit, settlement.new_stash, &self.ledger);

        log::debug!(
            "withdraw: requested={} withdrawn={} new_deposit={}",
            requested,
            to_withdraw,
            new_deposit
        );
        self.emit_deposit_operation(
            depositor,
            DepositOperationKind::Withdraw,
            &position,
            &settlement,
            0,
            to_withdraw,
        );
        self.emit_deposit_updated(depositor, new_deposit, settlement.new_stash);

        Ok(())
    }

    /// Pay out stashed collateral of a depositor with no remaining deposit
    pub fn claim_all_collateral_gains(&mut self, depositor: &Address) -> BoldResult<()> {
        // 1. Deposit must be gone
        let deposit = self.registry.deposit(depositor);
        check!(
            deposit.initial_value == 0,
            BoldError::HasDeposit {
                depositor: *depositor,
                deposit: deposit.initial_value,
            }
        );

        // 2. Something must be stashed
        let stashed = self.registry.stashed_collateral(depositor);
        require_positive(stashed)?;

        // 3. Stage, transfer, commit
        let mut accounting = self.accounting;
        accounting.decrease_coll_balance(stashed)?;

        self.tokens.send_collateral(depositor, stashed)?;

        self.accounting = accounting;
        self.registry
            .update_deposit_and_snapshots(depositor, 0, 0, &self.ledger);

        let position = Position {
            initial_value: 0,
            compounded: 0,
            coll_gain: 0,
            yield_gain: 0,
            stashed_coll: stashed,
        };
        let settlement = Settlement {
            kept_yield: 0,
            yield_sent: 0,
            new_stash: 0,
            coll_sent: stashed,
        };
        self.emit_deposit_operation(
            depositor,
            DepositOperationKind::ClaimAllCollateral,
            &position,
            &settlement,
            0,
            0,
        );
        self.emit_deposit_updated(depositor, 0, 0);

        Ok(())
    }

    // ============ Reads ============

    pub fn get_compounded_deposit(&self, depositor: &Address) -> BoldResult<Amount> {
        self.registry.compute_compounded_deposit(depositor, &self.ledger)
    }

    /// Collateral earned since the last snapshot, excluding the stash
    pub fn get_depositor_collateral_gain(&self, depositor: &Address) -> BoldResult<Amount> {
        self.registry.compute_collateral_gain(depositor, &self.ledger)
    }

    /// Yield earned since the last snapshot
    pub fn get_depositor_yield_gain(&self, depositor: &Address) -> BoldResult<Amount> {
        self.registry.compute_yield_gain(depositor, &self.ledger)
    }

    pub fn get_stashed_collateral(&self, depositor: &Address) -> Amount {
        self.registry.stashed_collateral(depositor)
    }

    pub fn get_total_deposits(&self) -> Amount {
        self.accounting.total_deposits()
    }

    pub fn get_coll_balance(&self) -> Amount {
        self.accounting.coll_balance()
    }

    pub fn get_yield_gains_owed(&self) -> Amount {
        self.accounting.yield_gains_owed()
    }

    // ============ Helpers ============

    fn position(&self, depositor: &Address) -> BoldResult<Position> {
        Ok(Position {
            initial_value: self.registry.deposit(depositor).initial_value,
            compounded: self.get_compounded_deposit(depositor)?,
            coll_gain: self.get_depositor_collateral_gain(depositor)?,
            yield_gain: self.get_depositor_yield_gain(depositor)?,
            stashed_coll: self.registry.stashed_collateral(depositor),
        })
    }

    fn emit_deposit_operation(
        &mut self,
        depositor: &Address,
        operation: DepositOperationKind,
        position: &Position,
        settlement: &Settlement,
        top_up: Amount,
        withdrawal: Amount,
    ) {
        self.events.emit(BoldEvent::DepositOperation {
            depositor: *depositor,
            operation,
            deposit_loss: position.deposit_loss(),
            top_up,
            withdrawal,
            yield_gain_since_last_op: position.yield_gain,
            yield_gain_claimed: settlement.yield_sent,
            coll_gain_since_last_op: position.coll_gain,
            coll_gain_claimed: settlement.coll_sent,
        });
    }

    fn emit_deposit_updated(&mut self, depositor: &Address, new_deposit: Amount, stashed_coll: Amount) {
        let snapshot = self.registry.snapshot(depositor);
        self.events.emit(BoldEvent::DepositUpdated {
            depositor: *depositor,
            new_deposit,
            stashed_coll,
            snapshot_p: snapshot.map(|s| s.p).unwrap_or(0),
            snapshot_s: snapshot.map(|s| s.s).unwrap_or_default(),
            snapshot_b: snapshot.map(|s| s.b).unwrap_or_default(),
            snapshot_scale: snapshot.map(|s| s.scale).unwrap_or(0),
            snapshot_epoch: snapshot.map(|s| s.epoch).unwrap_or(0),
        });
    }
}

// ============ Tests ============
