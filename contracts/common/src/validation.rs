//! Validation Helpers for the Stability Pool
//!
//! Reusable guards shared by the pool contract and its collaborators.
//!
//! ```rust,ignore
//! use bold_common::validation::{check, require_positive};
//!
//! check!(amount > 0, BoldError::ZeroAmount);
//! require_positive(top_up)?;
//! ```

use crate::{
    errors::{BoldError, BoldResult},
    types::{Amount, AppId},
};

// ============ Validation Macro ============

/// Check a condition and return an error if it fails.
///
/// ```rust,ignore
/// check!(
///     deposit.initial_value == 0,
///     BoldError::HasDeposit { depositor, deposit: deposit.initial_value }
/// );
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use crate::check;

// ============ Common Validation Helpers ============

/// Require an amount to be non-zero.
pub fn require_positive(amount: Amount) -> BoldResult<()> {
    check!(amount > 0, BoldError::ZeroAmount);
    Ok(())
}

/// Require sufficient balance for a transfer.
pub fn require_sufficient_balance(available: Amount, requested: Amount) -> BoldResult<()> {
    check!(
        available >= requested,
        BoldError::InsufficientBalance { available, requested }
    );
    Ok(())
}

/// Require the caller to be the designated collaborator.
pub fn require_caller(expected: AppId, actual: AppId) -> BoldResult<()> {
    check!(expected == actual, BoldError::Unauthorized { expected, actual });
    Ok(())
}

/// Require an identifier to not be all zeroes.
pub fn require_valid_address(address: AppId, reason: &'static str) -> BoldResult<()> {
    check!(address != [0u8; 32], BoldError::InvalidAddress { reason });
    Ok(())
}

// ============ Tests ============
