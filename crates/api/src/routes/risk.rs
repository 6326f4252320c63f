//! Stateless risk math.

use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use pegvault_common::error::AppError;
use pegvault_engine::PegEngine;
use pegvault_engine::health::is_healthy;

use super::parse_amount;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/risk/health-factor", get(health_factor))
}

#[derive(Debug, Deserialize)]
pub struct HealthFactorQuery {
    pub total_minted: String,
    pub collateral_value_usd: String,
}

#[derive(Debug, Serialize)]
pub struct HealthFactorResponse {
    pub health_factor: String,
    pub healthy: bool,
}

/// GET /api/risk/health-factor?total_minted=&collateral_value_usd=
async fn health_factor(
    Query(query): Query<HealthFactorQuery>,
) -> Result<Json<HealthFactorResponse>, AppError> {
    let total_minted = parse_amount("total_minted", &query.total_minted)?;
    let collateral_value_usd = parse_amount("collateral_value_usd", &query.collateral_value_usd)?;

    let health_factor = PegEngine::calculate_health_factor(total_minted, collateral_value_usd);

    Ok(Json(HealthFactorResponse {
        health_factor: health_factor.to_string(),
        healthy: is_healthy(health_factor),
    }))
}
