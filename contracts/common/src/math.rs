//! Fixed-Point Utilities for the Stability Pool
//!
//! `P` is bounded by 1e36 and token amounts can reach 1e30 or more, so every
//! product of the two is carried in a 256-bit integer before it is divided
//! back down.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uint::construct_uint;

use crate::constants::stability_pool::{SCALE_FACTOR, SCALE_SPAN};
use crate::errors::{BoldError, BoldResult};

construct_uint! {
    /// 256-bit unsigned integer for intermediate products and gain sums
    pub struct U256(4);
}

impl BorshSerialize for U256 {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        BorshSerialize::serialize(&self.0, writer)
    }
}

impl BorshDeserialize for U256 {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        Ok(U256(<[u64; 4] as BorshDeserialize>::deserialize_reader(reader)?))
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <[u64; 4] as Deserialize>::deserialize(deserializer).map(U256)
    }
}

/// Floor of `a * b / d`
pub fn mul_div(a: U256, b: U256, d: U256) -> BoldResult<U256> {
    if d.is_zero() {
        return Err(BoldError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(BoldError::Overflow)?;
    Ok(product / d)
}

/// Ceiling of `a * b / d`
///
/// Used for the debt term subtracted from P: rounding it up keeps the
/// rounding error on the side of the pool, never the depositors.
pub fn mul_div_ceil(a: U256, b: U256, d: U256) -> BoldResult<U256> {
    if d.is_zero() {
        return Err(BoldError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(BoldError::Overflow)?;
    let (quotient, remainder) = product.div_mod(d);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::one()).ok_or(BoldError::Overflow)
    }
}

/// `SCALE_FACTOR ^ exponent`, for exponents inside the scale span
pub fn scale_factor_pow(exponent: u64) -> U256 {
    debug_assert!(exponent <= SCALE_SPAN);
    let factor = U256::from(SCALE_FACTOR);
    (0..exponent).fold(U256::one(), |acc, _| acc * factor)
}

/// Narrow a 256-bit result back to an amount
pub fn to_amount(value: U256) -> BoldResult<u128> {
    if value.bits() > 128 {
        return Err(BoldError::Overflow);
    }
    Ok(value.low_u128())
}
