//! Fixed-Point Ledger
//!
//! Global accumulators of the Stability Pool. Any depositor can derive their
//! compounded deposit and pending gains from these values in O(1), so
//! liquidations and yield mints never touch individual deposits.
//!
//! ## State
//!
//! - **P**: running product, `(0, P_PRECISION]`. Every offset multiplies it
//!   by `1 - debt / total_deposits`.
//! - **S**: collateral gain per unit deposited, keyed by `(epoch, scale)`.
//! - **B**: yield gain per unit deposited, keyed by `(epoch, scale)`.
//! - **Scale**: bumped whenever P falls to `SCALE_BOUNDARY` and is rescaled.
//! - **Epoch**: bumped whenever an offset empties the pool completely.
//!
//! Sums are stored sparsely. A slot that was never written reads as zero.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::stability_pool::{
    MIN_DEPOSITS_FOR_YIELD, P_PRECISION, SCALE_BOUNDARY, SCALE_FACTOR,
};
use crate::errors::{BoldError, BoldResult, InvariantViolation};
use crate::math::{mul_div, mul_div_ceil, U256};
use crate::types::{Amount, Snapshot};
use crate::BTreeMap;

/// An `(epoch, scale)` pair addressing one slot of S or B
pub type EpochScale = (u64, u64);

/// Effect of a liquidation offset on the ledger, computed before anything is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetOutcome {
    /// Slot the collateral gain was recorded in
    pub slot: EpochScale,
    /// Amount added to S at `slot`
    pub s_increment: U256,
    /// Value of S at `slot` after the offset
    pub new_s: U256,
    /// P after the offset, rescaled or reset as needed
    pub new_p: u128,
    /// Scale after the offset
    pub new_scale: u64,
    /// Epoch after the offset
    pub new_epoch: u64,
    /// How many times P was multiplied by SCALE_FACTOR
    pub scale_changes: u64,
    /// True when the offset emptied the pool
    pub epoch_rolled: bool,
}

/// Effect of a yield notification on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YieldOutcome {
    /// Slot the yield gain was recorded in
    pub slot: EpochScale,
    /// Amount added to B at `slot` (zero when not attributed)
    pub b_increment: U256,
    /// Value of B at `slot` after the update
    pub new_b: U256,
    /// False when the yield was dropped for being below the dust threshold
    pub attributed: bool,
}

/// Global P/S/B accumulators of one Stability Pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FixedPointLedger {
    p: u128,
    current_scale: u64,
    current_epoch: u64,
    epoch_to_scale_to_s: BTreeMap<EpochScale, U256>,
    epoch_to_scale_to_b: BTreeMap<EpochScale, U256>,
}

impl Default for FixedPointLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedPointLedger {
    /// Fresh ledger: P = P_PRECISION, epoch 0, scale 0, no gains
    pub fn new() -> Self {
        Self {
            p: P_PRECISION,
            current_scale: 0,
            current_epoch: 0,
            epoch_to_scale_to_s: BTreeMap::new(),
            epoch_to_scale_to_b: BTreeMap::new(),
        }
    }

    // ============ Reads ============

    pub fn p(&self) -> u128 {
        self.p
    }

    pub fn current_scale(&self) -> u64 {
        self.current_scale
    }

    pub fn current_epoch(&self) -> u64 {
        self.current_epoch
    }

    /// S at `(epoch, scale)`; zero for slots never written
    pub fn s_at(&self, epoch: u64, scale: u64) -> U256 {
        self.epoch_to_scale_to_s
            .get(&(epoch, scale))
            .copied()
            .unwrap_or_default()
    }

    /// B at `(epoch, scale)`; zero for slots never written
    pub fn b_at(&self, epoch: u64, scale: u64) -> U256 {
        self.epoch_to_scale_to_b
            .get(&(epoch, scale))
            .copied()
            .unwrap_or_default()
    }

    pub fn current_s(&self) -> U256 {
        self.s_at(self.current_epoch, self.current_scale)
    }

    pub fn current_b(&self) -> U256 {
        self.b_at(self.current_epoch, self.current_scale)
    }

    /// Current accumulators, as a depositor snapshot would record them
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            p: self.p,
            s: self.current_s(),
            b: self.current_b(),
            scale: self.current_scale,
            epoch: self.current_epoch,
        }
    }

    /// SHA-256 over the Borsh encoding of the ledger
    pub fn commitment(&self) -> [u8; 32] {
        let encoded = borsh::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }

    // ============ Offsets ============

    /// Record a liquidation offset against `total_deposits`.
    ///
    /// `total_deposits` must be the pool total read before the offset.
    pub fn apply_offset(
        &mut self,
        debt_to_offset: Amount,
        coll_to_add: Amount,
        total_deposits: Amount,
    ) -> BoldResult<OffsetOutcome> {
        let outcome = self.preview_offset(debt_to_offset, coll_to_add, total_deposits)?;
        self.commit_offset(&outcome);
        Ok(outcome)
    }

    /// Compute the effect of an offset without writing anything
    pub fn preview_offset(
        &self,
        debt_to_offset: Amount,
        coll_to_add: Amount,
        total_deposits: Amount,
    ) -> BoldResult<OffsetOutcome> {
        let slot = (self.current_epoch, self.current_scale);
        let current_s = self.current_s();

        if debt_to_offset == 0 && coll_to_add == 0 {
            return Ok(OffsetOutcome {
                slot,
                s_increment: U256::zero(),
                new_s: current_s,
                new_p: self.p,
                new_scale: self.current_scale,
                new_epoch: self.current_epoch,
                scale_changes: 0,
                epoch_rolled: false,
            });
        }

        if total_deposits == 0 {
            return Err(BoldError::invariant(InvariantViolation::EmptyPoolOffset));
        }
        if debt_to_offset > total_deposits {
            return Err(BoldError::invariant(InvariantViolation::NegativeProduct));
        }

        let p = U256::from(self.p);
        let total = U256::from(total_deposits);

        // S rounds down: under-counting gains never makes the pool insolvent
        let s_increment = mul_div(p, U256::from(coll_to_add), total)?;
        let new_s = current_s
            .checked_add(s_increment)
            .ok_or(BoldError::Overflow)?;

        // The debt term rounds up so P never overstates what deposits are worth
        let p_loss = mul_div_ceil(p, U256::from(debt_to_offset), total)?;
        let remaining = p
            .checked_sub(p_loss)
            .ok_or(BoldError::invariant(InvariantViolation::NegativeProduct))?;
        // remaining <= P <= P_PRECISION, so it fits in u128
        let mut new_p = remaining.low_u128();

        let mut new_scale = self.current_scale;
        let mut new_epoch = self.current_epoch;
        let mut scale_changes = 0;
        let epoch_rolled = new_p == 0;

        if epoch_rolled {
            new_p = P_PRECISION;
            new_epoch += 1;
            new_scale = 0;
        } else {
            while new_p <= SCALE_BOUNDARY {
                new_p *= SCALE_FACTOR;
                new_scale += 1;
                scale_changes += 1;
            }
        }

        Ok(OffsetOutcome {
            slot,
            s_increment,
            new_s,
            new_p,
            new_scale,
            new_epoch,
            scale_changes,
            epoch_rolled,
        })
    }

    /// Write a previously previewed offset
    pub fn commit_offset(&mut self, outcome: &OffsetOutcome) {
        if !outcome.s_increment.is_zero() {
            self.epoch_to_scale_to_s.insert(outcome.slot, outcome.new_s);
        }

        if outcome.epoch_rolled {
            log::debug!(
                "stability pool emptied, epoch {} -> {}",
                self.current_epoch,
                outcome.new_epoch
            );
        }
        if outcome.scale_changes > 0 {
            log::debug!(
                "P rescaled {} time(s), scale {} -> {}",
                outcome.scale_changes,
                self.current_scale,
                outcome.new_scale
            );
        }

        self.p = outcome.new_p;
        self.current_scale = outcome.new_scale;
        self.current_epoch = outcome.new_epoch;
    }

    // ============ Yield ============

    /// Fold a yield amount into B.
    ///
    /// Below `MIN_DEPOSITS_FOR_YIELD` total deposits, or for a zero amount,
    /// B is left untouched and the outcome reports `attributed == false`.
    pub fn apply_yield(
        &mut self,
        yield_amount: Amount,
        total_deposits: Amount,
    ) -> BoldResult<YieldOutcome> {
        let outcome = self.preview_yield(yield_amount, total_deposits)?;
        self.commit_yield(&outcome);
        Ok(outcome)
    }

    /// Compute the effect of a yield notification without writing anything
    pub fn preview_yield(
        &self,
        yield_amount: Amount,
        total_deposits: Amount,
    ) -> BoldResult<YieldOutcome> {
        let slot = (self.current_epoch, self.current_scale);
        let current_b = self.current_b();

        if total_deposits < MIN_DEPOSITS_FOR_YIELD || yield_amount == 0 {
            return Ok(YieldOutcome {
                slot,
                b_increment: U256::zero(),
                new_b: current_b,
                attributed: false,
            });
        }

        let b_increment = mul_div(
            U256::from(self.p),
            U256::from(yield_amount),
            U256::from(total_deposits),
        )?;
        let new_b = current_b
            .checked_add(b_increment)
            .ok_or(BoldError::Overflow)?;

        Ok(YieldOutcome {
            slot,
            b_increment,
            new_b,
            attributed: true,
        })
    }

    /// Write a previously previewed yield update
    pub fn commit_yield(&mut self, outcome: &YieldOutcome) {
        if outcome.attributed && !outcome.b_increment.is_zero() {
            self.epoch_to_scale_to_b.insert(outcome.slot, outcome.new_b);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::token::ONE;

    const E36: u128 = P_PRECISION;

    #[test]
    fn test_new_ledger() {
        let ledger = FixedPointLedger::new();
        assert_eq!(ledger.p(), P_PRECISION);
        assert_eq!(ledger.current_scale(), 0);
        assert_eq!(ledger.current_epoch(), 0);
        assert!(ledger.current_s().is_zero());
        assert!(ledger.current_b().is_zero());
    }

    #[test]
    fn test_simple_offset() {
        let mut ledger = FixedPointLedger::new();

        let outcome = ledger.apply_offset(400, 4, 1000).unwrap();

        assert_eq!(outcome.s_increment, U256::from(E36 * 4 / 1000));
        assert_eq!(ledger.s_at(0, 0), U256::from(4 * 10u128.pow(33)));
        assert_eq!(ledger.p(), 6 * 10u128.pow(35));
        assert_eq!(ledger.current_scale(), 0);
        assert_eq!(ledger.current_epoch(), 0);
    }

    #[test]
    fn test_debt_term_rounds_up() {
        let mut ledger = FixedPointLedger::new();

        // 1e36 * 1 / 3 leaves a remainder, so the loss is rounded up
        ledger.apply_offset(1, 0, 3).unwrap();

        assert_eq!(ledger.p(), E36 - (E36 / 3 + 1));
    }

    #[test]
    fn test_full_wipeout_starts_new_epoch() {
        let mut ledger = FixedPointLedger::new();
        ledger.apply_offset(100, 1, 1000).unwrap();

        let outcome = ledger.apply_offset(900, 9, 900).unwrap();

        assert!(outcome.epoch_rolled);
        assert_eq!(ledger.p(), P_PRECISION);
        assert_eq!(ledger.current_epoch(), 1);
        assert_eq!(ledger.current_scale(), 0);
        // Gains of the old epoch stay readable, the new epoch starts empty
        assert!(!ledger.s_at(0, 0).is_zero());
        assert!(ledger.current_s().is_zero());
    }

    #[test]
    fn test_scale_rollover_single_crossing() {
        let mut ledger = FixedPointLedger::new();
        let total = 1_000_000_000_000u128;

        // Leaves P = 1e24, below the 1e27 boundary
        let outcome = ledger.apply_offset(total - 1, 0, total).unwrap();

        assert_eq!(outcome.scale_changes, 1);
        assert_eq!(ledger.current_scale(), 1);
        assert_eq!(ledger.p(), 10u128.pow(33));
    }

    #[test]
    fn test_scale_rollover_multiple_crossings_in_one_offset() {
        let mut ledger = FixedPointLedger::new();
        let total = 10u128.pow(30);

        // Leaves P = 1e6, which needs three rescalings to clear 1e27
        let outcome = ledger.apply_offset(total - 1, 0, total).unwrap();

        assert_eq!(outcome.scale_changes, 3);
        assert_eq!(ledger.current_scale(), 3);
        assert_eq!(ledger.p(), 10u128.pow(33));
    }

    #[test]
    fn test_p_exactly_at_boundary_is_rescaled() {
        let mut ledger = FixedPointLedger::new();
        let total = 1_000_000_000u128;

        // P = 1e36 - ceil(1e36 * (1e9 - 1) / 1e9) = 1e27, exactly the boundary
        ledger.apply_offset(total - 1, 0, total).unwrap();

        assert_eq!(ledger.current_scale(), 1);
        assert_eq!(ledger.p(), P_PRECISION);
    }

    #[test]
    fn test_gains_after_rescale_land_in_new_slot() {
        let mut ledger = FixedPointLedger::new();
        let total = 1_000_000_000_000u128;
        ledger.apply_offset(total - 1, 0, total).unwrap();

        ledger.apply_offset(0, 5, 1).unwrap();

        assert!(ledger.s_at(0, 0).is_zero());
        assert_eq!(ledger.s_at(0, 1), U256::from(10u128.pow(33)) * U256::from(5u64));
    }

    #[test]
    fn test_offset_empty_pool_is_fatal() {
        let mut ledger = FixedPointLedger::new();
        let before = ledger.clone();

        let result = ledger.apply_offset(10, 1, 0);

        assert_eq!(
            result,
            Err(BoldError::ArithmeticInvariantViolation {
                reason: InvariantViolation::EmptyPoolOffset
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_offset_exceeding_deposits_is_fatal() {
        let mut ledger = FixedPointLedger::new();

        let result = ledger.apply_offset(1001, 1, 1000);

        assert_eq!(
            result,
            Err(BoldError::ArithmeticInvariantViolation {
                reason: InvariantViolation::NegativeProduct
            })
        );
        assert_eq!(ledger.p(), P_PRECISION);
    }

    #[test]
    fn test_zero_offset_is_noop() {
        let mut ledger = FixedPointLedger::new();
        let outcome = ledger.apply_offset(0, 0, 0).unwrap();
        assert_eq!(outcome.new_p, P_PRECISION);
        assert_eq!(ledger, FixedPointLedger::new());
    }

    #[test]
    fn test_collateral_only_offset_keeps_p() {
        let mut ledger = FixedPointLedger::new();
        ledger.apply_offset(0, 10, 1000).unwrap();
        assert_eq!(ledger.p(), P_PRECISION);
        assert_eq!(ledger.current_s(), U256::from(E36 / 100));
    }

    #[test]
    fn test_yield_updates_b() {
        let mut ledger = FixedPointLedger::new();

        let outcome = ledger.apply_yield(50 * ONE, 1_000 * ONE).unwrap();

        assert!(outcome.attributed);
        assert_eq!(ledger.current_b(), U256::from(E36 / 20));
    }

    #[test]
    fn test_dust_yield_dropped() {
        let mut ledger = FixedPointLedger::new();

        let outcome = ledger.apply_yield(100, ONE - 1).unwrap();

        assert!(!outcome.attributed);
        assert!(ledger.current_b().is_zero());
        assert_eq!(ledger, FixedPointLedger::new());
    }

    #[test]
    fn test_zero_yield_dropped() {
        let mut ledger = FixedPointLedger::new();
        let outcome = ledger.apply_yield(0, 1_000 * ONE).unwrap();
        assert!(!outcome.attributed);
    }

    #[test]
    fn test_sums_are_monotonic_within_slot() {
        let mut ledger = FixedPointLedger::new();
        let mut last_s = ledger.current_s();
        let mut last_b = ledger.current_b();

        for _ in 0..5 {
            ledger.apply_offset(10 * ONE, ONE, 10_000 * ONE).unwrap();
            ledger.apply_yield(ONE, 10_000 * ONE).unwrap();
            assert!(ledger.current_s() >= last_s);
            assert!(ledger.current_b() >= last_b);
            last_s = ledger.current_s();
            last_b = ledger.current_b();
        }
    }

    #[test]
    fn test_commitment_tracks_state() {
        let mut ledger = FixedPointLedger::new();
        let initial = ledger.commitment();
        assert_eq!(initial, FixedPointLedger::new().commitment());

        ledger.apply_offset(1, 0, 10).unwrap();
        assert_ne!(ledger.commitment(), initial);
    }

    #[test]
    fn test_snapshot_reflects_current_slot() {
        let mut ledger = FixedPointLedger::new();
        ledger.apply_offset(400, 4, 1000).unwrap();
        ledger.apply_yield(ONE, 10 * ONE).unwrap();

        let snap = ledger.snapshot();
        assert_eq!(snap.p, ledger.p());
        assert_eq!(snap.s, ledger.current_s());
        assert_eq!(snap.b, ledger.current_b());
        assert_eq!(snap.scale, 0);
        assert_eq!(snap.epoch, 0);
    }
}
