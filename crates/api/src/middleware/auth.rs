//! JWT authentication middleware and helpers.
//!
//! Provides JWT encoding/decoding plus an `AuthUser` Axum extractor
//! that validates the Authorization header on protected routes.

use std::str::FromStr;

use alloy::primitives::Address;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use pegvault_common::error::AppError;

use crate::state::AppState;

/// JWT claims stored in the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the checksummed wallet address that signed in
    pub sub: String,
    /// Expiration time (UNIX timestamp)
    pub exp: i64,
    /// Issued at (UNIX timestamp)
    pub iat: i64,
}

/// Authenticated wallet extracted from a JWT.
///
/// Use as an Axum extractor on protected routes:
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     // auth.wallet is the caller every engine operation acts for
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub wallet: Address,
    pub claims: Claims,
}

/// Encode a JWT token for a wallet.
pub fn encode_jwt(wallet: Address, secret: &str, expiry_hours: u64) -> Result<String, AppError> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: wallet.to_checksum(None),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Auth(format!("Failed to encode JWT: {}", e)))
}

/// Decode and validate a JWT token.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Extracts and validates the JWT from the `Authorization: Bearer <token>` header.
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = state.config.jwt_secret.clone();

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        async move {
            let token = auth_header
                .as_deref()
                .and_then(|h| h.strip_prefix("Bearer "))
                .ok_or_else(|| {
                    AppError::Auth("Missing or invalid Authorization header. Use 'Bearer <JWT>'".to_string())
                })?;

            let claims = decode_jwt(token, &secret)?;
            let wallet = Address::from_str(&claims.sub)
                .map_err(|_| AppError::Auth("Invalid wallet address in token".to_string()))?;
            Ok(AuthUser { wallet, claims })
        }
    }
}
