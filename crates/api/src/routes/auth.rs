//! Authentication routes: SIWE verification.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use alloy::primitives::Address;
use pegvault_common::error::AppError;

use crate::middleware::auth::encode_jwt;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth/siwe", post(siwe_login))
}

/// Request body for SIWE login.
#[derive(Debug, Deserialize)]
pub struct SiweLoginRequest {
    /// The SIWE message string
    pub message: String,
    /// The wallet's signature of the message
    pub signature: String,
}

/// Response for successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub wallet_address: Address,
}

/// POST /api/auth/siwe: verify SIWE message + signature, return a JWT for the wallet.
async fn siwe_login(
    State(state): State<AppState>,
    Json(req): Json<SiweLoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let message: siwe::Message = req
        .message
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid SIWE message: {}", e)))?;

    let sig_bytes = alloy::hex::decode(&req.signature)
        .map_err(|e| AppError::Validation(format!("Invalid hex signature: {}", e)))?;

    // Default verification options: no domain or nonce check
    let opts = siwe::VerificationOpts::default();
    message
        .verify(&sig_bytes, &opts)
        .await
        .map_err(|e| AppError::Auth(format!("Signature verification failed: {}", e)))?;

    let wallet_address = Address::from(message.address);

    let token = encode_jwt(
        wallet_address,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;

    tracing::info!(wallet = %wallet_address, "Wallet authenticated via SIWE");

    Ok(Json(LoginResponse {
        token,
        wallet_address,
    }))
}
