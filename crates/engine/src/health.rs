//! Health factor math.
//!
//! A position's health factor is its threshold-adjusted collateral value over
//! its debt, both in 18-decimal USD. Positions without debt report `U256::MAX`.

use alloy::primitives::U256;

use crate::constants::{LIQUIDATION_PRECISION, LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR, PRECISION};

/// Pure health factor for the given debt and collateral value.
///
/// A result too large to represent is clamped to `U256::MAX`.
pub fn calculate_health_factor(total_minted: U256, collateral_value_usd: U256) -> U256 {
    if total_minted.is_zero() {
        return U256::MAX;
    }
    let Some(weighted) = collateral_value_usd.checked_mul(LIQUIDATION_THRESHOLD) else {
        return U256::MAX;
    };
    let adjusted = weighted / LIQUIDATION_PRECISION;
    adjusted
        .checked_mul(PRECISION)
        .map_or(U256::MAX, |scaled| scaled / total_minted)
}

pub fn is_healthy(health_factor: U256) -> bool {
    health_factor >= MIN_HEALTH_FACTOR
}
