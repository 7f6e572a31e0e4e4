//! Core Types for the BOLD Stability Pool
//!
//! Data structures shared by the ledger, the deposit registry and the
//! stability pool contract.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::math::U256;

/// Type alias for depositor addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for app identifiers (collaborating contracts)
pub type AppId = [u8; 32];

/// Token amount in base units (18 decimals)
pub type Amount = u128;

// ============ Deposit Types ============

/// A depositor's principal as of their last snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Deposit {
    /// Compounded deposit at the time the snapshot was taken
    pub initial_value: Amount,
}

/// Ledger accumulators captured when a deposit was last fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Snapshot {
    /// Product P
    pub p: u128,
    /// Collateral gain sum S at (epoch, scale)
    pub s: U256,
    /// Yield gain sum B at (epoch, scale)
    pub b: U256,
    /// Scale at snapshot time
    pub scale: u64,
    /// Epoch at snapshot time
    pub epoch: u64,
}

// ============ Actions ============

/// Actions accepted by the Stability Pool contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StabilityPoolAction {
    /// Deposit BOLD, optionally claiming gains
    Provide { amount: Amount, claim: bool },
    /// Withdraw BOLD (capped at the compounded deposit), optionally claiming gains
    Withdraw { amount: Amount, claim: bool },
    /// Claim stashed collateral after the deposit is gone
    ClaimAllCollateral,
    /// Absorb liquidated debt (liquidation engine only)
    Offset { debt: Amount, collateral: Amount },
    /// Distribute minted interest (interest engine only)
    DistributeYield { amount: Amount },
}
