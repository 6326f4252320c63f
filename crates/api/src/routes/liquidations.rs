//! Liquidation of unhealthy positions by the signed-in wallet.

use alloy::primitives::Address;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use pegvault_common::error::AppError;
use pegvault_engine::LiquidationReceipt;

use super::{parse_address, parse_amount};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/liquidations", post(liquidate))
}

#[derive(Debug, Deserialize)]
pub struct LiquidationRequest {
    /// Owner of the position being liquidated
    pub user: String,
    /// Collateral asset to seize
    pub asset: String,
    /// PEG the caller repays on the user's behalf
    pub debt_to_cover: String,
}

#[derive(Debug, Serialize)]
pub struct LiquidationResponse {
    pub user: Address,
    pub liquidator: Address,
    pub asset: Address,
    pub debt_covered: String,
    pub collateral_seized: String,
    pub bonus: String,
    pub starting_health_factor: String,
    pub ending_health_factor: String,
}

impl From<LiquidationReceipt> for LiquidationResponse {
    fn from(r: LiquidationReceipt) -> Self {
        Self {
            user: r.user,
            liquidator: r.liquidator,
            asset: r.asset,
            debt_covered: r.debt_covered.to_string(),
            collateral_seized: r.collateral_seized.to_string(),
            bonus: r.bonus.to_string(),
            starting_health_factor: r.starting_health_factor.to_string(),
            ending_health_factor: r.ending_health_factor.to_string(),
        }
    }
}

/// POST /api/liquidations
async fn liquidate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LiquidationRequest>,
) -> Result<Json<LiquidationResponse>, AppError> {
    let user = parse_address("user", &req.user)?;
    let asset = parse_address("asset", &req.asset)?;
    let debt_to_cover = parse_amount("debt_to_cover", &req.debt_to_cover)?;

    let receipt = state
        .engine
        .lock()
        .await
        .liquidate(auth.wallet, asset, user, debt_to_cover)?;

    Ok(Json(receipt.into()))
}
