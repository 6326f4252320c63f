//! Risk parameters. Percentages are expressed over [`LIQUIDATION_PRECISION`].

use alloy::primitives::U256;

/// Fixed-point scale of PEG and USD amounts (1e18).
pub const PRECISION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Decimal places of [`PRECISION`].
pub const PRECISION_DECIMALS: u8 = 18;

/// Share of collateral value that counts toward solvency (2:1 overcollateralization).
pub const LIQUIDATION_THRESHOLD: U256 = U256::from_limbs([50, 0, 0, 0]);

pub const LIQUIDATION_PRECISION: U256 = U256::from_limbs([100, 0, 0, 0]);

/// Extra collateral paid to a liquidator, on top of the debt it covers.
pub const LIQUIDATION_BONUS: U256 = U256::from_limbs([10, 0, 0, 0]);

/// Health factor of 1.0; anything below is liquidatable.
pub const MIN_HEALTH_FACTOR: U256 = PRECISION;
