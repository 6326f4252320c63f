//! Position management for the signed-in wallet.
//!
//! Every route acts for the wallet in the caller's JWT and answers with the
//! wallet's account snapshot after the operation.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use pegvault_common::error::AppError;

use super::accounts::{AccountResponse, account_snapshot};
use super::{parse_address, parse_amount};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/positions/deposit", post(deposit))
        .route("/api/positions/redeem", post(redeem))
        .route("/api/positions/mint", post(mint))
        .route("/api/positions/burn", post(burn))
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub asset: String,
    pub amount: String,
    /// PEG to mint in the same operation
    pub mint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub asset: String,
    pub amount: String,
    /// PEG to burn in the same operation
    pub burn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: String,
}

/// POST /api/positions/deposit
async fn deposit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<DepositRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let asset = parse_address("asset", &req.asset)?;
    let amount = parse_amount("amount", &req.amount)?;
    let mint = req.mint.as_deref().map(|m| parse_amount("mint", m)).transpose()?;

    let mut engine = state.engine.lock().await;
    match mint {
        Some(to_mint) => engine.deposit_collateral_and_mint(auth.wallet, asset, amount, to_mint)?,
        None => engine.deposit_collateral(auth.wallet, asset, amount)?,
    }

    tracing::info!(
        wallet = %auth.wallet,
        asset = %asset,
        amount = %amount,
        mint = ?mint,
        "Deposit via API"
    );
    Ok(Json(account_snapshot(&engine, &state, auth.wallet)?))
}

/// POST /api/positions/redeem
async fn redeem(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let asset = parse_address("asset", &req.asset)?;
    let amount = parse_amount("amount", &req.amount)?;
    let burn = req.burn.as_deref().map(|b| parse_amount("burn", b)).transpose()?;

    let mut engine = state.engine.lock().await;
    match burn {
        Some(to_burn) => engine.redeem_collateral_for_peg(auth.wallet, asset, amount, to_burn)?,
        None => engine.redeem_collateral(auth.wallet, asset, amount)?,
    }

    tracing::info!(
        wallet = %auth.wallet,
        asset = %asset,
        amount = %amount,
        burn = ?burn,
        "Redeem via API"
    );
    Ok(Json(account_snapshot(&engine, &state, auth.wallet)?))
}

/// POST /api/positions/mint
async fn mint(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let amount = parse_amount("amount", &req.amount)?;

    let mut engine = state.engine.lock().await;
    engine.mint(auth.wallet, amount)?;

    Ok(Json(account_snapshot(&engine, &state, auth.wallet)?))
}

/// POST /api/positions/burn
async fn burn(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let amount = parse_amount("amount", &req.amount)?;

    let mut engine = state.engine.lock().await;
    engine.burn(auth.wallet, amount)?;

    Ok(Json(account_snapshot(&engine, &state, auth.wallet)?))
}
