//! Collateral catalogue and price conversions.

use alloy::primitives::Address;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pegvault_common::error::AppError;
use pegvault_engine::TokenLedger;

use super::{parse_address, parse_amount};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/collateral", get(list_collateral))
        .route("/api/collateral/{asset}/usd-value", get(usd_value))
        .route("/api/collateral/{asset}/amount-from-usd", get(amount_from_usd))
}

#[derive(Debug, Serialize)]
pub struct CollateralInfo {
    pub asset: Address,
    pub price_feed: Address,
    /// Latest feed answer in the feed's own decimals; absent until a quote arrives
    pub price: Option<String>,
    pub decimals: Option<u8>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Amount held in custody across all positions
    pub total_deposited: String,
}

#[derive(Debug, Deserialize)]
pub struct UsdValueQuery {
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct AmountFromUsdQuery {
    pub usd: String,
}

#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    pub asset: Address,
    pub amount: String,
    pub usd_value: String,
}

/// GET /api/collateral: registered assets with their feeds and latest quotes.
async fn list_collateral(State(state): State<AppState>) -> Json<Vec<CollateralInfo>> {
    let engine = state.engine.lock().await;
    let custody = engine.custody();

    let assets = engine
        .collateral_configs()
        .into_iter()
        .map(|config| {
            let quote = state.prices.quote(config.price_feed);
            CollateralInfo {
                asset: config.asset,
                price_feed: config.price_feed,
                price: quote.map(|q| q.price.to_string()),
                decimals: quote.map(|q| q.decimals),
                updated_at: quote.map(|q| q.updated_at),
                total_deposited: state
                    .collateral_token(config.asset)
                    .map(|t| t.balance_of(custody))
                    .unwrap_or_default()
                    .to_string(),
            }
        })
        .collect();

    Json(assets)
}

/// GET /api/collateral/{asset}/usd-value?amount=
async fn usd_value(
    State(state): State<AppState>,
    Path(asset): Path<String>,
    Query(query): Query<UsdValueQuery>,
) -> Result<Json<ConversionResponse>, AppError> {
    let asset = parse_address("asset", &asset)?;
    let amount = parse_amount("amount", &query.amount)?;

    let usd = state.engine.lock().await.usd_value(asset, amount)?;

    Ok(Json(ConversionResponse {
        asset,
        amount: amount.to_string(),
        usd_value: usd.to_string(),
    }))
}

/// GET /api/collateral/{asset}/amount-from-usd?usd=
async fn amount_from_usd(
    State(state): State<AppState>,
    Path(asset): Path<String>,
    Query(query): Query<AmountFromUsdQuery>,
) -> Result<Json<ConversionResponse>, AppError> {
    let asset = parse_address("asset", &asset)?;
    let usd = parse_amount("usd", &query.usd)?;

    let amount = state.engine.lock().await.token_amount_from_usd(asset, usd)?;

    Ok(Json(ConversionResponse {
        asset,
        amount: amount.to_string(),
        usd_value: usd.to_string(),
    }))
}
