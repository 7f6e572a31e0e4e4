//! Error Types for the BOLD Stability Pool
//!
//! Every failure aborts the whole operation; nothing is partially committed.
//! Errors carry enough context to be machine-readable through [`BoldError::code`].

use crate::types::{Address, Amount, AppId};
use core::fmt;

/// Result type alias for Stability Pool operations
pub type BoldResult<T> = Result<T, BoldError>;

/// Main error enum for all Stability Pool errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoldError {
    // ============ Amount Errors ============
    /// Zero amount not allowed
    ZeroAmount,

    /// Collaborator could not cover a transfer
    InsufficientBalance { available: Amount, requested: Amount },

    // ============ Depositor Errors ============
    /// Withdrawal attempted without a deposit
    NoDeposit { depositor: Address },

    /// Collateral-only claim attempted while principal remains
    HasDeposit { depositor: Address, deposit: Amount },

    // ============ Authorization Errors ============
    /// Caller is not the designated collaborator for this entry point
    Unauthorized { expected: AppId, actual: AppId },

    /// Invalid address (e.g., zero address in config)
    InvalidAddress {
        /// Description of why the address is invalid
        reason: &'static str,
    },

    // ============ Invariant Errors ============
    /// Fatal accounting violation; indicates a caller contract bug upstream
    ArithmeticInvariantViolation { reason: InvariantViolation },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Division by zero
    DivisionByZero,

    // ============ Input Validation Errors ============
    /// Witness bytes could not be decoded into an action
    InvalidWitness { reason: &'static str },
}

/// Reasons for a fatal arithmetic invariant violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Offset routed to a pool with no deposits
    EmptyPoolOffset,
    /// Offset debt exceeds total deposits, P would go negative
    NegativeProduct,
    /// Aggregate counter would drop below zero
    CounterUnderflow,
    /// Aggregate counter would exceed its range
    CounterOverflow,
    /// Stored snapshot has P == 0
    ZeroSnapshotProduct,
}

impl InvariantViolation {
    /// Short description for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyPoolOffset => "offset against empty pool",
            Self::NegativeProduct => "debt to offset exceeds total deposits",
            Self::CounterUnderflow => "aggregate counter underflow",
            Self::CounterOverflow => "aggregate counter overflow",
            Self::ZeroSnapshotProduct => "snapshot product is zero",
        }
    }
}

impl BoldError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "E010_ZERO_AMOUNT",
            Self::InsufficientBalance { .. } => "E011_INSUFFICIENT_BALANCE",
            Self::NoDeposit { .. } => "E050_NO_DEPOSIT",
            Self::HasDeposit { .. } => "E051_HAS_DEPOSIT",
            Self::Unauthorized { .. } => "E020_UNAUTHORIZED",
            Self::InvalidAddress { .. } => "E021_INVALID_ADDRESS",
            Self::ArithmeticInvariantViolation { .. } => "E060_INVARIANT_VIOLATION",
            Self::Overflow => "E080_OVERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::InvalidWitness { .. } => "E090_INVALID_WITNESS",
        }
    }

    /// Returns true if the error signals a bug upstream rather than a user mistake
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ArithmeticInvariantViolation { .. } | Self::Overflow | Self::DivisionByZero
        )
    }

    pub(crate) fn invariant(reason: InvariantViolation) -> Self {
        Self::ArithmeticInvariantViolation { reason }
    }
}

impl fmt::Display for BoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArithmeticInvariantViolation { reason } => {
                write!(f, "{}: {}", self.code(), reason.as_str())
            }
            Self::InsufficientBalance { available, requested } => {
                write!(f, "{}: requested {} but only {} available", self.code(), requested, available)
            }
            Self::InvalidAddress { reason } | Self::InvalidWitness { reason } => {
                write!(f, "{}: {}", self.code(), reason)
            }
            _ => f.write_str(self.code()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoldError {}
