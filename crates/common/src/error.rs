use alloy::primitives::{Address, U256};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Rejection reasons of the accounting engine.
///
/// Every variant aborts the operation that produced it; no partial effects
/// persist and nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported collateral asset: {0}")]
    UnsupportedAsset(Address),

    #[error(
        "Insufficient balance for {account} in {asset}: requested {requested}, available {available}"
    )]
    InsufficientBalance {
        account: Address,
        asset: Address,
        requested: U256,
        available: U256,
    },

    #[error("Token transfer failed: {0}")]
    TransferFailed(String),

    #[error("Health factor would drop to {0}, below the minimum")]
    HealthFactorBreach(U256),

    #[error("Mint failed: {0}")]
    MintFailed(String),

    #[error("Position is not liquidatable (health factor {0})")]
    LiquidationNotEligible(U256),

    #[error("Liquidation did not improve health factor ({starting} -> {ending})")]
    LiquidationIneffective { starting: U256, ending: U256 },

    #[error("Re-entrant call rejected")]
    Reentrancy,

    #[error("Price unavailable for feed {feed}: {reason}")]
    PriceUnavailable { feed: Address, reason: String },

    #[error("Arithmetic fault: {0}")]
    ArithmeticFault(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation failed and at least one completed token interaction
    /// could not be reversed.
    #[error("{cause}; rollback incomplete: {}", .failures.join("; "))]
    RollbackIncomplete {
        cause: Box<EngineError>,
        failures: Vec<String>,
    },
}

impl EngineError {
    /// Stable, machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::UnsupportedAsset(_) => "unsupported_asset",
            EngineError::InsufficientBalance { .. } => "insufficient_balance",
            EngineError::TransferFailed(_) => "transfer_failed",
            EngineError::HealthFactorBreach(_) => "health_factor_breach",
            EngineError::MintFailed(_) => "mint_failed",
            EngineError::LiquidationNotEligible(_) => "liquidation_not_eligible",
            EngineError::LiquidationIneffective { .. } => "liquidation_ineffective",
            EngineError::Reentrancy => "reentrancy",
            EngineError::PriceUnavailable { .. } => "price_unavailable",
            EngineError::ArithmeticFault(_) => "arithmetic_fault",
            EngineError::Config(_) => "config",
            EngineError::RollbackIncomplete { .. } => "rollback_incomplete",
        }
    }

    /// The health factor that caused the rejection, if the error carries one.
    pub fn health_factor(&self) -> Option<U256> {
        match self {
            EngineError::HealthFactorBreach(ratio) | EngineError::LiquidationNotEligible(ratio) => {
                Some(*ratio)
            }
            EngineError::LiquidationIneffective { ending, .. } => Some(*ending),
            EngineError::RollbackIncomplete { cause, .. } => cause.health_factor(),
            _ => None,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) | EngineError::UnsupportedAsset(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::InsufficientBalance { .. }
            | EngineError::HealthFactorBreach(_)
            | EngineError::LiquidationNotEligible(_)
            | EngineError::LiquidationIneffective { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Reentrancy => StatusCode::CONFLICT,
            EngineError::TransferFailed(_) | EngineError::MintFailed(_) => StatusCode::BAD_GATEWAY,
            EngineError::PriceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::ArithmeticFault(_)
            | EngineError::Config(_)
            | EngineError::RollbackIncomplete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Engine(err) => {
                let mut body = json!({ "error": err.to_string(), "kind": err.kind() });
                if let Some(ratio) = err.health_factor() {
                    body["health_factor"] = json!(ratio.to_string());
                }
                (err.status(), body)
            }
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": msg, "kind": "config" }),
            ),
            AppError::Auth(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": msg, "kind": "auth" }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": msg, "kind": "not_found" }),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "kind": "validation" }),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": msg, "kind": "internal" }),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breach_carries_ratio() {
        let err = EngineError::HealthFactorBreach(U256::from(999u64));
        assert_eq!(err.kind(), "health_factor_breach");
        assert_eq!(err.health_factor(), Some(U256::from(999u64)));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_unsupported_asset_is_client_error() {
        let err = EngineError::UnsupportedAsset(Address::repeat_byte(0x11));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.health_factor().is_none());
    }

    #[test]
    fn test_collaborator_failures_map_to_bad_gateway() {
        assert_eq!(
            EngineError::TransferFailed("paused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            EngineError::MintFailed("paused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_incomplete_rollback_keeps_cause() {
        let err = EngineError::RollbackIncomplete {
            cause: Box::new(EngineError::MintFailed("paused".into())),
            failures: vec!["refund of 5 to 0x01 failed".into()],
        };
        assert_eq!(err.kind(), "rollback_incomplete");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Mint failed: paused; rollback incomplete: refund of 5 to 0x01 failed"
        );
    }

    #[test]
    fn test_app_error_response_status() {
        let response = AppError::from(EngineError::Reentrancy).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::Auth("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
