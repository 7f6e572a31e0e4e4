//! Property tests for the ledger and deposit registry

use quickcheck_macros::quickcheck;

use crate::constants::token::ONE;
use crate::deposits::DepositRegistry;
use crate::ledger::FixedPointLedger;
use crate::math::{mul_div, to_amount, U256};
use crate::types::{Address, Amount};
use crate::Vec;

const MAX_OFFSETS: usize = 20;

/// Base units a depositor may lose to rounding beyond their pro-rata share
const LOSS_TOLERANCE: Amount = 2;

fn depositor(i: usize) -> Address {
    let mut address = [0u8; 32];
    address[0] = 1;
    address[31] = i as u8;
    address
}

/// Whole-token amount in `1..=1_000_000`
fn tokens(raw: u64) -> Amount {
    ((raw % 1_000_000) as u128 + 1) * ONE
}

/// Fraction of the pool in per-mille, never a full wipeout
fn per_mille(raw: u16) -> u128 {
    (raw % 1000) as u128
}

#[quickcheck]
fn test_compounded_deposit_never_increases(deposit: u64, other: u64, cuts: Vec<u16>) -> bool {
    let mut ledger = FixedPointLedger::new();
    let mut registry = DepositRegistry::new();
    let d = tokens(deposit);
    let o = tokens(other);
    registry.update_deposit_and_snapshots(&depositor(0), d, 0, &ledger);
    registry.update_deposit_and_snapshots(&depositor(1), o, 0, &ledger);

    let mut total = d + o;
    let mut last = d;
    for cut in cuts.into_iter().take(MAX_OFFSETS) {
        let debt = total * per_mille(cut) / 1000;
        if ledger.apply_offset(debt, 0, total).is_err() {
            return false;
        }
        total -= debt;

        let compounded = match registry.compute_compounded_deposit(&depositor(0), &ledger) {
            Ok(value) => value,
            Err(_) => return false,
        };
        if compounded > last {
            return false;
        }
        last = compounded;
    }
    true
}

#[quickcheck]
fn test_no_loss_beyond_share(deposits: Vec<u64>, cuts: Vec<u16>) -> bool {
    if deposits.is_empty() {
        return true;
    }
    let mut ledger = FixedPointLedger::new();
    let mut registry = DepositRegistry::new();

    let mut total = 0u128;
    let count = deposits.len().min(16);
    for (i, raw) in deposits.into_iter().take(count).enumerate() {
        let amount = tokens(raw);
        registry.update_deposit_and_snapshots(&depositor(i), amount, 0, &ledger);
        total += amount;
    }

    let mut coll_added = 0u128;
    for cut in cuts.into_iter().take(MAX_OFFSETS) {
        let debt = total * per_mille(cut) / 1000;
        let coll = debt / 100;
        if ledger.apply_offset(debt, coll, total).is_err() {
            return false;
        }
        total -= debt;
        coll_added += coll;
    }

    let mut compounded_sum = 0u128;
    let mut gains_sum = 0u128;
    for i in 0..count {
        let (Ok(compounded), Ok(gain)) = (
            registry.compute_compounded_deposit(&depositor(i), &ledger),
            registry.compute_collateral_gain(&depositor(i), &ledger),
        ) else {
            return false;
        };
        if compounded > registry.deposit(&depositor(i)).initial_value {
            return false;
        }
        compounded_sum += compounded;
        gains_sum += gain;
    }

    compounded_sum <= total && gains_sum <= coll_added
}

#[quickcheck]
fn test_loss_bounded_by_share(deposits: Vec<u64>, cut: u16) -> bool {
    if deposits.is_empty() {
        return true;
    }
    let mut ledger = FixedPointLedger::new();
    let mut registry = DepositRegistry::new();

    let mut total = 0u128;
    let count = deposits.len().min(16);
    for (i, raw) in deposits.into_iter().take(count).enumerate() {
        let amount = tokens(raw);
        registry.update_deposit_and_snapshots(&depositor(i), amount, 0, &ledger);
        total += amount;
    }

    let debt = total * per_mille(cut) / 1000;
    if ledger.apply_offset(debt, 0, total).is_err() {
        return false;
    }

    (0..count).all(|i| {
        let initial = registry.deposit(&depositor(i)).initial_value;
        let share = mul_div(U256::from(initial), U256::from(debt), U256::from(total))
            .and_then(to_amount);
        match (registry.compute_compounded_deposit(&depositor(i), &ledger), share) {
            (Ok(compounded), Ok(share)) => {
                initial.saturating_sub(compounded) <= share + LOSS_TOLERANCE
            }
            _ => false,
        }
    })
}

#[quickcheck]
fn test_fresh_deposit_is_worth_its_value(history: Vec<u16>, amount: u64) -> bool {
    let mut ledger = FixedPointLedger::new();
    let mut total = 1_000_000 * ONE;
    for cut in history.into_iter().take(MAX_OFFSETS) {
        let debt = total * per_mille(cut) / 1000;
        if ledger.apply_offset(debt, debt / 100, total).is_err() {
            return false;
        }
        total -= debt;
    }

    let mut registry = DepositRegistry::new();
    let value = tokens(amount);
    registry.update_deposit_and_snapshots(&depositor(0), value, 0, &ledger);

    registry.compute_compounded_deposit(&depositor(0), &ledger) == Ok(value)
        && registry.compute_collateral_gain(&depositor(0), &ledger) == Ok(0)
        && registry.compute_yield_gain(&depositor(0), &ledger) == Ok(0)
}

#[quickcheck]
fn test_yield_split_never_exceeds_amount(a: u64, b: u64, yield_raw: u64) -> bool {
    let mut ledger = FixedPointLedger::new();
    let mut registry = DepositRegistry::new();
    let (da, db) = (tokens(a), tokens(b));
    registry.update_deposit_and_snapshots(&depositor(0), da, 0, &ledger);
    registry.update_deposit_and_snapshots(&depositor(1), db, 0, &ledger);

    let amount = yield_raw as u128;
    if ledger.apply_yield(amount, da + db).is_err() {
        return false;
    }

    match (
        registry.compute_yield_gain(&depositor(0), &ledger),
        registry.compute_yield_gain(&depositor(1), &ledger),
    ) {
        (Ok(ga), Ok(gb)) => ga + gb <= amount,
        _ => false,
    }
}
