//! Liquidation of undercollateralized positions.
//!
//! A liquidator repays part of a user's debt with their own PEG and receives
//! the equivalent collateral plus a bonus. The liquidation must leave the
//! user's health factor strictly higher than before, and must not leave the
//! liquidator's own position unhealthy.

use alloy::primitives::{Address, U256};
use pegvault_common::error::EngineError;
use serde::Serialize;

use crate::constants::{LIQUIDATION_BONUS, LIQUIDATION_PRECISION, MIN_HEALTH_FACTOR};
use crate::engine::{PegEngine, require_positive};
use crate::math;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiquidationReceipt {
    pub user: Address,
    pub liquidator: Address,
    pub asset: Address,
    /// PEG burned from the liquidator against the user's debt
    pub debt_covered: U256,
    /// Total collateral paid to the liquidator, bonus included
    pub collateral_seized: U256,
    pub bonus: U256,
    pub starting_health_factor: U256,
    pub ending_health_factor: U256,
}

impl PegEngine {
    pub fn liquidate(
        &mut self,
        liquidator: Address,
        asset: Address,
        user: Address,
        debt_to_cover: U256,
    ) -> Result<LiquidationReceipt, EngineError> {
        self.transact("liquidate", |engine, tx, settlement| {
            let listing = engine.listing(asset)?;
            require_positive(debt_to_cover, "debt to cover")?;

            let starting_health_factor = engine.health_factor_in(&*tx, user)?;
            if starting_health_factor >= MIN_HEALTH_FACTOR {
                return Err(EngineError::LiquidationNotEligible(starting_health_factor));
            }

            let covered_in_asset = engine.token_amount_from_usd(asset, debt_to_cover)?;
            let bonus = math::mul_div(covered_in_asset, LIQUIDATION_BONUS, LIQUIDATION_PRECISION)?;
            let collateral_seized = math::checked_add(covered_in_asset, bonus)?;

            tx.record_withdrawal(user, liquidator, asset, collateral_seized)?;
            tx.record_burn(user, liquidator, debt_to_cover)?;

            let ending_health_factor = engine.health_factor_in(&*tx, user)?;
            if ending_health_factor <= starting_health_factor {
                return Err(EngineError::LiquidationIneffective {
                    starting: starting_health_factor,
                    ending: ending_health_factor,
                });
            }
            engine.ensure_healthy(&*tx, liquidator)?;

            tx.record_liquidation(user, liquidator, asset, debt_to_cover);

            settlement.pull_and_burn_peg(&engine.peg, liquidator, debt_to_cover)?;
            settlement.pay_collateral(&listing.token, liquidator, collateral_seized)?;

            tracing::info!(
                user = %user,
                liquidator = %liquidator,
                asset = %asset,
                debt_covered = %debt_to_cover,
                collateral_seized = %collateral_seized,
                starting_health_factor = %starting_health_factor,
                ending_health_factor = %ending_health_factor,
                "Position liquidated"
            );

            Ok(LiquidationReceipt {
                user,
                liquidator,
                asset,
                debt_covered: debt_to_cover,
                collateral_seized,
                bonus,
                starting_health_factor,
                ending_health_factor,
            })
        })
    }
}
