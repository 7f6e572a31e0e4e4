//! Deposit Registry
//!
//! Per-depositor state of the Stability Pool: the deposit as of its last
//! snapshot, the ledger snapshot itself, and collateral gains that were
//! computed but not yet paid out.
//!
//! Nothing here is updated by liquidations or yield. A deposit ages
//! implicitly as the [`FixedPointLedger`] moves away from its snapshot, and
//! the current values are derived on demand:
//!
//! ```text
//! compounded = initial * P / P_snap / SCALE_FACTOR^(scale - scale_snap)
//! gain       = initial * (Σ_i sum(epoch_snap, scale_snap + i) / SCALE_FACTOR^i - sum_snap) / P_snap
//! ```

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::stability_pool::SCALE_SPAN;
use crate::errors::{BoldError, BoldResult, InvariantViolation};
use crate::ledger::FixedPointLedger;
use crate::math::{mul_div, scale_factor_pow, to_amount, U256};
use crate::types::{Address, Amount, Deposit, Snapshot};
use crate::BTreeMap;

/// Depositor records of one Stability Pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DepositRegistry {
    deposits: BTreeMap<Address, Deposit>,
    snapshots: BTreeMap<Address, Snapshot>,
    stashed_coll: BTreeMap<Address, Amount>,
}

impl DepositRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Reads ============

    /// Deposit as of the last snapshot; zero for unknown depositors
    pub fn deposit(&self, depositor: &Address) -> Deposit {
        self.deposits.get(depositor).copied().unwrap_or_default()
    }

    pub fn snapshot(&self, depositor: &Address) -> Option<Snapshot> {
        self.snapshots.get(depositor).copied()
    }

    pub fn stashed_collateral(&self, depositor: &Address) -> Amount {
        self.stashed_coll.get(depositor).copied().unwrap_or(0)
    }

    /// Number of depositors with a live deposit
    pub fn depositor_count(&self) -> usize {
        self.deposits.len()
    }

    // ============ Derived Values ============

    /// Current value of a deposit after all offsets since its snapshot.
    ///
    /// Zero when the pool was emptied after the snapshot, or when P moved
    /// more than `SCALE_SPAN` scales since.
    pub fn compute_compounded_deposit(
        &self,
        depositor: &Address,
        ledger: &FixedPointLedger,
    ) -> BoldResult<Amount> {
        let initial_value = self.deposit(depositor).initial_value;
        if initial_value == 0 {
            return Ok(0);
        }
        let snapshot = self.require_snapshot(depositor)?;

        if snapshot.epoch < ledger.current_epoch() {
            return Ok(0);
        }

        let scale_diff = ledger.current_scale().saturating_sub(snapshot.scale);
        if scale_diff > SCALE_SPAN {
            return Ok(0);
        }

        let compounded = mul_div(
            U256::from(initial_value),
            U256::from(ledger.p()),
            U256::from(snapshot.p),
        )? / scale_factor_pow(scale_diff);

        to_amount(compounded)
    }

    /// Collateral earned since the snapshot, excluding anything stashed
    pub fn compute_collateral_gain(
        &self,
        depositor: &Address,
        ledger: &FixedPointLedger,
    ) -> BoldResult<Amount> {
        self.pending_gain(depositor, |snap| snap.s, |epoch, scale| {
            ledger.s_at(epoch, scale)
        })
    }

    /// Yield earned since the snapshot
    pub fn compute_yield_gain(
        &self,
        depositor: &Address,
        ledger: &FixedPointLedger,
    ) -> BoldResult<Amount> {
        self.pending_gain(depositor, |snap| snap.b, |epoch, scale| {
            ledger.b_at(epoch, scale)
        })
    }

    fn pending_gain<F, G>(&self, depositor: &Address, snapshot_sum: F, sum_at: G) -> BoldResult<Amount>
    where
        F: Fn(&Snapshot) -> U256,
        G: Fn(u64, u64) -> U256,
    {
        let initial_value = self.deposit(depositor).initial_value;
        if initial_value == 0 {
            return Ok(0);
        }
        let snapshot = self.require_snapshot(depositor)?;

        // Gains past SCALE_SPAN scales are too small to register
        let mut normalized = sum_at(snapshot.epoch, snapshot.scale).saturating_sub(snapshot_sum(&snapshot));
        for i in 1..=SCALE_SPAN {
            let later = sum_at(snapshot.epoch, snapshot.scale.saturating_add(i));
            normalized = normalized
                .checked_add(later / scale_factor_pow(i))
                .ok_or(BoldError::Overflow)?;
        }

        let gain = mul_div(normalized, U256::from(initial_value), U256::from(snapshot.p))?;
        to_amount(gain)
    }

    fn require_snapshot(&self, depositor: &Address) -> BoldResult<Snapshot> {
        let snapshot = self
            .snapshot(depositor)
            .ok_or(BoldError::NoDeposit { depositor: *depositor })?;
        if snapshot.p == 0 {
            return Err(BoldError::invariant(InvariantViolation::ZeroSnapshotProduct));
        }
        Ok(snapshot)
    }

    // ============ Writes ============

    /// Fix a depositor's state against the current ledger.
    ///
    /// A zero deposit removes the deposit and snapshot records; the stash is
    /// kept until claimed.
    pub fn update_deposit_and_snapshots(
        &mut self,
        depositor: &Address,
        new_deposit_value: Amount,
        new_stashed_coll: Amount,
        ledger: &FixedPointLedger,
    ) {
        if new_stashed_coll == 0 {
            self.stashed_coll.remove(depositor);
        } else {
            self.stashed_coll.insert(*depositor, new_stashed_coll);
        }

        if new_deposit_value == 0 {
            self.deposits.remove(depositor);
            self.snapshots.remove(depositor);
            return;
        }

        self.deposits.insert(
            *depositor,
            Deposit {
                initial_value: new_deposit_value,
            },
        );
        self.snapshots.insert(*depositor, ledger.snapshot());
    }
}

// ============================================================================
// Tests
// ============================================================================
