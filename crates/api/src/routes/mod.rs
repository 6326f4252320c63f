pub mod accounts;
pub mod auth;
pub mod collateral;
pub mod faucet;
pub mod health;
pub mod liquidations;
pub mod positions;
pub mod protocol;
pub mod risk;

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use axum::Router;

use pegvault_common::error::AppError;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(collateral::router())
        .merge(risk::router())
        .merge(accounts::router())
        .merge(protocol::router())
        .merge(positions::router())
        .merge(liquidations::router());

    if state.config.faucet_enabled {
        router = router.merge(faucet::router());
    }

    router.with_state(state)
}

/// Parse a base-10 integer amount, as carried in request bodies and queries.
pub(crate) fn parse_amount(field: &str, raw: &str) -> Result<U256, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    U256::from_str_radix(raw, 10).map_err(|_| {
        AppError::Validation(format!("{field} must be a non-negative base-10 integer"))
    })
}

pub(crate) fn parse_address(field: &str, raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("{field} is not a valid address")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("amount", "1000").unwrap(), U256::from(1000u64));
        assert_eq!(
            parse_amount("amount", "30000000000000000000000").unwrap(),
            U256::from(30_000u64) * U256::from(1_000_000_000_000_000_000u64)
        );
        assert!(parse_amount("amount", "-1").is_err());
        assert!(parse_amount("amount", "0x10").is_err());
        assert!(parse_amount("amount", "").is_err());
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address("asset", "0x4242424242424242424242424242424242424242").unwrap();
        assert_eq!(addr, Address::repeat_byte(0x42));
        assert!(parse_address("asset", "0x1234").is_err());
    }
}
