//! BOLD Common Library
//!
//! Shared types, constants, and the reward-distribution engine of the BOLD
//! Stability Pool.
//!
//! The Stability Pool absorbs liquidated debt and hands the liquidated
//! collateral, plus the interest yield minted by its branch, back to its
//! depositors. Each of those events touches only a handful of global
//! accumulators; no operation ever iterates over depositors.
//!
//! ## Key Features
//!
//! - **Running Product P**: compounded deposits derived in O(1) from a snapshot
//! - **Gain Sums S and B**: collateral and yield gains per unit deposited
//! - **Scale Rollover**: P is rescaled by 1e9 before it loses precision
//! - **Epoch Rollover**: a full wipeout starts a new epoch with fresh accumulators
//! - **Ceiling on Losses**: rounding always favours the pool over depositors
//! - **State Commitment**: SHA-256 digest of the ledger for external verification
//! - **Typed Events**: every transition leaves an auditable event trail
//!
//! This crate is `no_std` compatible when built without the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, vec::Vec};

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod validation;
pub mod events;
pub mod ledger;
pub mod deposits;


#[cfg(test)]
mod properties;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use ledger::*;
pub use deposits::*;
