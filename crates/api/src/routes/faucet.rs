//! Sandbox faucet. Mounted only when `SANDBOX_FAUCET` is enabled.

use alloy::primitives::Address;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use pegvault_common::error::AppError;
use pegvault_engine::TokenLedger;

use super::{parse_address, parse_amount};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/faucet", post(drip))
}

#[derive(Debug, Deserialize)]
pub struct FaucetRequest {
    pub asset: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct FaucetResponse {
    pub asset: Address,
    pub wallet: Address,
    pub balance: String,
}

/// POST /api/faucet: credit collateral tokens to the caller's wallet.
async fn drip(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<FaucetRequest>,
) -> Result<Json<FaucetResponse>, AppError> {
    let asset = parse_address("asset", &req.asset)?;
    let amount = parse_amount("amount", &req.amount)?;

    let token = state
        .collateral_token(asset)
        .ok_or_else(|| AppError::NotFound(format!("No collateral token {asset}")))?;
    token.credit(auth.wallet, amount);

    tracing::info!(wallet = %auth.wallet, asset = %asset, amount = %amount, "Faucet drip");

    Ok(Json(FaucetResponse {
        asset,
        wallet: auth.wallet,
        balance: token.balance_of(auth.wallet).to_string(),
    }))
}
