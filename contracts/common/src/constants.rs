//! Protocol Constants
//!
//! Numeric parameters of the Stability Pool reward engine. The product `P`
//! and the gain sums `S`/`B` live in a fixed-point space scaled by
//! [`stability_pool::P_PRECISION`]; token amounts carry 18 decimals.

/// Token Metadata
pub mod token {
    /// One whole token in base units
    pub const ONE: u128 = 1_000_000_000_000_000_000;
}

/// Precision constants
pub mod precision {
    /// Base precision of token amounts (1e18)
    pub const DECIMAL_PRECISION: u128 = 1_000_000_000_000_000_000;
}

/// Stability Pool Configuration
pub mod stability_pool {
    /// Fixed-point base of the running product P (1e36).
    /// P always lives in `(0, P_PRECISION]`.
    pub const P_PRECISION: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000;

    /// Factor P is multiplied by whenever it drops to the scale boundary (1e9)
    pub const SCALE_FACTOR: u128 = 1_000_000_000;

    /// P at or below this value is rescaled by SCALE_FACTOR (1e27).
    /// Leaves 1e27 of headroom, well above the 1e9 floor the rescale needs.
    pub const SCALE_BOUNDARY: u128 = P_PRECISION / SCALE_FACTOR;

    /// Number of scale changes a deposit may span before it is treated as
    /// fully depleted. Also the width of the gain lookup window.
    pub const SCALE_SPAN: u64 = 4;

    /// Below this total, yield is not attributed to depositors (1 BOLD)
    pub const MIN_DEPOSITS_FOR_YIELD: u128 = super::precision::DECIMAL_PRECISION;
}
