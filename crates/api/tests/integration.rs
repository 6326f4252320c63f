//! Integration tests for API routes.
//!
//! Uses `tower::ServiceExt` to test Axum routes without a real HTTP server.
//! State is the in-memory sandbox, so no external services are needed.

use alloy::primitives::{Address, I256, U256};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use pegvault_api::middleware::auth::encode_jwt;
use pegvault_api::routes::create_router;
use pegvault_api::state::AppState;
use pegvault_common::config::AppConfig;

// ============================================================
// Helpers
// ============================================================

const JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

fn weth() -> Address {
    Address::repeat_byte(0xE1)
}

fn wbtc() -> Address {
    Address::repeat_byte(0xB1)
}

fn weth_feed() -> Address {
    Address::repeat_byte(0xF1)
}

fn wbtc_feed() -> Address {
    Address::repeat_byte(0xF2)
}

fn alice() -> Address {
    Address::repeat_byte(0x01)
}

fn bob() -> Address {
    Address::repeat_byte(0x02)
}

/// `n` whole tokens as an 18-decimal integer string.
fn units(n: u64) -> String {
    (U256::from(n) * U256::from(1_000_000_000_000_000_000u64)).to_string()
}

fn usd_answer(dollars: i64) -> I256 {
    I256::try_from(dollars * 100_000_000).unwrap()
}

fn test_config(faucet_enabled: bool) -> AppConfig {
    AppConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        custody_address: Address::repeat_byte(0xCC),
        peg_token_address: Address::repeat_byte(0xBE),
        collateral_tokens: vec![weth(), wbtc()],
        price_feeds: vec![weth_feed(), wbtc_feed()],
        seed_prices: vec![(weth_feed(), usd_answer(4_000)), (wbtc_feed(), usd_answer(60_000))],
        price_feed_decimals: 8,
        price_rpc_url: None,
        price_poll_interval_ms: 2000,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: 24,
        faucet_enabled,
    }
}

fn build_test_state() -> AppState {
    AppState::sandbox(test_config(false)).unwrap()
}

fn token_for(wallet: Address) -> String {
    encode_jwt(wallet, JWT_SECRET, 24).unwrap()
}

/// Give `wallet` some collateral tokens directly, bypassing the faucet route.
fn fund(state: &AppState, wallet: Address, asset: Address, whole_tokens: u64) {
    let amount = U256::from(whole_tokens) * U256::from(1_000_000_000_000_000_000u64);
    state.collateral_token(asset).unwrap().credit(wallet, amount);
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn address_field(body: &Value, field: &str) -> Address {
    body[field].as_str().unwrap().parse().unwrap()
}

// ============================================================
// Public routes
// ============================================================

#[tokio::test]
async fn test_health_endpoint() {
    let state = build_test_state();
    let (status, body) = send(create_router(state), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pegvault-api");
    assert_eq!(body["collateral_assets"], 2);
}

#[tokio::test]
async fn test_list_collateral() {
    let state = build_test_state();
    let (status, body) = send(create_router(state), get("/api/collateral")).await;

    assert_eq!(status, StatusCode::OK);
    let assets = body.as_array().unwrap();
    assert_eq!(assets.len(), 2);
    assert_eq!(address_field(&assets[0], "asset"), weth());
    assert_eq!(address_field(&assets[0], "price_feed"), weth_feed());
    assert_eq!(assets[0]["price"], "400000000000");
    assert_eq!(assets[0]["decimals"], 8);
    assert_eq!(assets[0]["total_deposited"], "0");
}

#[tokio::test]
async fn test_usd_value_conversion() {
    let state = build_test_state();
    let uri = format!("/api/collateral/{}/usd-value?amount={}", weth(), units(15));
    let (status, body) = send(create_router(state), get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usd_value"], units(60_000));
}

#[tokio::test]
async fn test_amount_from_usd_conversion() {
    let state = build_test_state();
    let uri = format!("/api/collateral/{}/amount-from-usd?usd={}", weth(), units(100));
    let (status, body) = send(create_router(state), get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], "25000000000000000");
}

#[tokio::test]
async fn test_unsupported_asset_is_bad_request() {
    let state = build_test_state();
    let uri = format!("/api/collateral/{}/usd-value?amount=1", Address::repeat_byte(0x77));
    let (status, body) = send(create_router(state), get(&uri)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "unsupported_asset");
}

#[tokio::test]
async fn test_malformed_amount_rejected() {
    let state = build_test_state();
    let uri = format!("/api/collateral/{}/usd-value?amount=1.5", weth());
    let (status, body) = send(create_router(state), get(&uri)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_risk_health_factor() {
    let state = build_test_state();

    let uri = format!(
        "/api/risk/health-factor?total_minted={}&collateral_value_usd={}",
        units(30_000),
        units(60_000)
    );
    let (status, body) = send(create_router(state.clone()), get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["health_factor"], units(1));
    assert_eq!(body["healthy"], true);

    let uri = "/api/risk/health-factor?total_minted=0&collateral_value_usd=0";
    let (_, body) = send(create_router(state), get(uri)).await;
    assert_eq!(body["health_factor"], U256::MAX.to_string());
}

#[tokio::test]
async fn test_unknown_account_is_empty() {
    let state = build_test_state();
    let uri = format!("/api/accounts/{}", alice());
    let (status, body) = send(create_router(state), get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_minted"], "0");
    assert_eq!(body["collateral_value_usd"], "0");
    assert_eq!(body["healthy"], true);
    assert_eq!(body["collateral"].as_array().unwrap().len(), 2);
}

// ============================================================
// Authenticated routes
// ============================================================

#[tokio::test]
async fn test_positions_require_auth() {
    let state = build_test_state();
    let req = post_json(
        "/api/positions/deposit",
        None,
        json!({ "asset": weth().to_string(), "amount": units(1) }),
    );
    let (status, body) = send(create_router(state), req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "auth");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let state = build_test_state();
    let bad = encode_jwt(alice(), "some-other-secret", 24).unwrap();
    let req = post_json("/api/positions/mint", Some(&bad), json!({ "amount": "1" }));
    let (status, _) = send(create_router(state), req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deposit_and_mint_flow() {
    let state = build_test_state();
    fund(&state, alice(), weth(), 15);
    let token = token_for(alice());

    let req = post_json(
        "/api/positions/deposit",
        Some(&token),
        json!({ "asset": weth().to_string(), "amount": units(15), "mint": units(30_000) }),
    );
    let (status, body) = send(create_router(state.clone()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(address_field(&body, "user"), alice());
    assert_eq!(body["total_minted"], units(30_000));
    assert_eq!(body["collateral_value_usd"], units(60_000));
    assert_eq!(body["health_factor"], units(1));
    assert_eq!(body["peg_balance"], units(30_000));

    // One more wei of debt breaks the minimum health factor
    let req = post_json("/api/positions/mint", Some(&token), json!({ "amount": "1" }));
    let (status, body) = send(create_router(state.clone()), req).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "health_factor_breach");
    assert!(body["health_factor"].is_string());

    let uri = format!("/api/accounts/{}", alice());
    let (_, body) = send(create_router(state), get(&uri)).await;
    assert_eq!(body["total_minted"], units(30_000));
}

#[tokio::test]
async fn test_deposit_zero_is_validation_error() {
    let state = build_test_state();
    fund(&state, alice(), weth(), 1);
    let token = token_for(alice());

    let req = post_json(
        "/api/positions/deposit",
        Some(&token),
        json!({ "asset": weth().to_string(), "amount": "0" }),
    );
    let (status, body) = send(create_router(state), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_deposit_without_tokens_is_bad_gateway() {
    let state = build_test_state();
    let token = token_for(alice());

    let req = post_json(
        "/api/positions/deposit",
        Some(&token),
        json!({ "asset": weth().to_string(), "amount": units(1) }),
    );
    let (status, body) = send(create_router(state), req).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "transfer_failed");
}

#[tokio::test]
async fn test_redeem_and_burn() {
    let state = build_test_state();
    fund(&state, alice(), weth(), 10);
    let token = token_for(alice());

    let req = post_json(
        "/api/positions/deposit",
        Some(&token),
        json!({ "asset": weth().to_string(), "amount": units(10), "mint": units(5_000) }),
    );
    assert_eq!(send(create_router(state.clone()), req).await.0, StatusCode::OK);

    let req = post_json("/api/positions/burn", Some(&token), json!({ "amount": units(1_000) }));
    let (status, body) = send(create_router(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_minted"], units(4_000));

    let req = post_json(
        "/api/positions/redeem",
        Some(&token),
        json!({ "asset": weth().to_string(), "amount": units(10), "burn": units(4_000) }),
    );
    let (status, body) = send(create_router(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_minted"], "0");
    assert_eq!(body["collateral_value_usd"], "0");

    let (_, totals) = send(create_router(state), get("/api/protocol/totals")).await;
    assert_eq!(totals["open_positions"], 0);
    assert_eq!(totals["peg_supply"], "0");
    assert_eq!(totals["solvent"], true);
}

#[tokio::test]
async fn test_liquidation_flow() {
    let state = build_test_state();
    fund(&state, alice(), weth(), 10);
    fund(&state, bob(), weth(), 10);

    for (wallet, mint) in [(alice(), 10_000), (bob(), 1_000)] {
        let req = post_json(
            "/api/positions/deposit",
            Some(&token_for(wallet)),
            json!({ "asset": weth().to_string(), "amount": units(10), "mint": units(mint) }),
        );
        assert_eq!(send(create_router(state.clone()), req).await.0, StatusCode::OK);
    }

    let liquidation = json!({
        "user": alice().to_string(),
        "asset": weth().to_string(),
        "debt_to_cover": units(1_000),
    });

    // Healthy at $4000
    let req = post_json("/api/liquidations", Some(&token_for(bob())), liquidation.clone());
    let (status, body) = send(create_router(state.clone()), req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "liquidation_not_eligible");

    state.prices.set_price(weth_feed(), usd_answer(1_900), 8);

    let req = post_json("/api/liquidations", Some(&token_for(bob())), liquidation);
    let (status, body) = send(create_router(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collateral_seized"], "578947368421052631");
    assert_eq!(body["bonus"], "52631578947368421");
    assert_eq!(body["starting_health_factor"], "950000000000000000");
    assert_eq!(address_field(&body, "liquidator"), bob());

    let uri = format!("/api/events?user={}", alice());
    let (status, events) = send(create_router(state.clone()), get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "collateral_deposited",
            "peg_minted",
            "collateral_redeemed",
            "peg_burned",
            "position_liquidated",
        ]
    );

    let (_, events) = send(create_router(state), get("/api/events?since=4")).await;
    assert_eq!(events.as_array().unwrap().len(), 3);
}

// ============================================================
// Faucet
// ============================================================

#[tokio::test]
async fn test_faucet_hidden_by_default() {
    let state = build_test_state();
    let req = post_json(
        "/api/faucet",
        Some(&token_for(alice())),
        json!({ "asset": weth().to_string(), "amount": units(1) }),
    );
    let (status, _) = send(create_router(state), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_faucet_credits_caller() {
    let state = AppState::sandbox(test_config(true)).unwrap();
    let req = post_json(
        "/api/faucet",
        Some(&token_for(alice())),
        json!({ "asset": weth().to_string(), "amount": units(5) }),
    );
    let (status, body) = send(create_router(state.clone()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], units(5));

    let req = post_json(
        "/api/faucet",
        Some(&token_for(alice())),
        json!({ "asset": Address::repeat_byte(0x77).to_string(), "amount": "1" }),
    );
    let (status, body) = send(create_router(state), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[test]
fn test_sandbox_rejects_mismatched_feeds() {
    let mut config = test_config(false);
    config.price_feeds.pop();
    assert!(AppState::sandbox(config).is_err());
}
