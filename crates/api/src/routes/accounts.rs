//! Account views.

use alloy::primitives::Address;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use pegvault_common::error::AppError;
use pegvault_engine::health::is_healthy;
use pegvault_engine::{PegEngine, TokenLedger};

use super::parse_address;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/accounts/{user}", get(get_account))
}

#[derive(Debug, Serialize)]
pub struct CollateralBalance {
    pub asset: Address,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub user: Address,
    pub total_minted: String,
    pub collateral_value_usd: String,
    pub health_factor: String,
    pub healthy: bool,
    /// Deposited collateral per registered asset
    pub collateral: Vec<CollateralBalance>,
    /// PEG held in the user's wallet
    pub peg_balance: String,
}

/// Snapshot of `user`'s position as the engine sees it.
pub(crate) fn account_snapshot(
    engine: &PegEngine,
    state: &AppState,
    user: Address,
) -> Result<AccountResponse, AppError> {
    let info = engine.account_information(user)?;
    let health_factor = engine.health_factor(user)?;

    let collateral = engine
        .collateral_tokens()
        .iter()
        .map(|asset| CollateralBalance {
            asset: *asset,
            amount: engine.collateral_balance(user, *asset).to_string(),
        })
        .collect();

    Ok(AccountResponse {
        user,
        total_minted: info.total_minted.to_string(),
        collateral_value_usd: info.collateral_value_usd.to_string(),
        health_factor: health_factor.to_string(),
        healthy: is_healthy(health_factor),
        collateral,
        peg_balance: state.peg.balance_of(user).to_string(),
    })
}

/// GET /api/accounts/{user}
async fn get_account(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let user = parse_address("user", &user)?;
    let engine = state.engine.lock().await;
    Ok(Json(account_snapshot(&engine, &state, user)?))
}
