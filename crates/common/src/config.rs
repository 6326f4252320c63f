use std::net::SocketAddr;
use std::str::FromStr;

use alloy::primitives::{Address, I256};
use serde::Deserialize;

/// Custody account used by the sandbox when `ENGINE_CUSTODY_ADDRESS` is unset.
pub const DEFAULT_CUSTODY_ADDRESS: &str = "0x00000000000000000000000000000000000E9e11";

/// PEG token id used by the sandbox when `PEG_TOKEN_ADDRESS` is unset.
pub const DEFAULT_PEG_TOKEN_ADDRESS: &str = "0x000000000000000000000000000000000000BE65";

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Socket the API server binds to (default: 0.0.0.0:3000)
    pub listen_addr: SocketAddr,

    /// Account that holds deposited collateral and PEG in transit
    pub custody_address: Address,

    /// Identifier of the pegged token
    pub peg_token_address: Address,

    /// Accepted collateral assets, in registration order
    pub collateral_tokens: Vec<Address>,

    /// Price feed per collateral asset, same order as `collateral_tokens`
    pub price_feeds: Vec<Address>,

    /// Initial `(feed, answer)` pairs loaded into the price book at startup
    pub seed_prices: Vec<(Address, I256)>,

    /// Decimals of seeded prices and of feeds that do not report their own (default: 8)
    pub price_feed_decimals: u8,

    /// RPC endpoint used to follow on-chain price feeds; static prices when unset
    pub price_rpc_url: Option<String>,

    /// Interval between price feed polls in milliseconds (default: 2000)
    pub price_poll_interval_ms: u64,

    /// JWT secret for API authentication
    pub jwt_secret: String,

    /// JWT token expiry in hours
    pub jwt_expiry_hours: u64,

    /// Expose the collateral faucet route (sandbox deployments only)
    pub faucet_enabled: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LISTEN_ADDR must be a socket address"))?,
            custody_address: parse_address(
                "ENGINE_CUSTODY_ADDRESS",
                &std::env::var("ENGINE_CUSTODY_ADDRESS")
                    .unwrap_or_else(|_| DEFAULT_CUSTODY_ADDRESS.to_string()),
            )?,
            peg_token_address: parse_address(
                "PEG_TOKEN_ADDRESS",
                &std::env::var("PEG_TOKEN_ADDRESS")
                    .unwrap_or_else(|_| DEFAULT_PEG_TOKEN_ADDRESS.to_string()),
            )?,
            collateral_tokens: parse_address_list(
                "COLLATERAL_TOKENS",
                &std::env::var("COLLATERAL_TOKENS").map_err(|_| {
                    anyhow::anyhow!("COLLATERAL_TOKENS environment variable is required")
                })?,
            )?,
            price_feeds: parse_address_list(
                "PRICE_FEEDS",
                &std::env::var("PRICE_FEEDS")
                    .map_err(|_| anyhow::anyhow!("PRICE_FEEDS environment variable is required"))?,
            )?,
            seed_prices: parse_seed_prices(&std::env::var("SEED_PRICES").unwrap_or_default())?,
            price_feed_decimals: std::env::var("PRICE_FEED_DECIMALS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PRICE_FEED_DECIMALS must be a valid u8"))?,
            price_rpc_url: std::env::var("PRICE_RPC_URL").ok(),
            price_poll_interval_ms: std::env::var("PRICE_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PRICE_POLL_INTERVAL_MS must be a valid u64"))?,
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            jwt_expiry_hours: std::env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("JWT_EXPIRY_HOURS must be a valid u64"))?,
            faucet_enabled: std::env::var("SANDBOX_FAUCET")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

fn parse_address(name: &str, raw: &str) -> anyhow::Result<Address> {
    Address::from_str(raw.trim())
        .map_err(|e| anyhow::anyhow!("{name} contains an invalid address '{raw}': {e}"))
}

/// Parse a comma-separated list of addresses. Blank entries are ignored.
pub fn parse_address_list(name: &str, raw: &str) -> anyhow::Result<Vec<Address>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_address(name, s))
        .collect()
}

/// Parse `feed=answer` pairs, e.g. `0xfeed...=400000000000,0xfeed2...=100000000`.
pub fn parse_seed_prices(raw: &str) -> anyhow::Result<Vec<(Address, I256)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (feed, answer) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("SEED_PRICES entry '{pair}' must be feed=answer"))?;
            let feed = parse_address("SEED_PRICES", feed)?;
            let answer = I256::from_dec_str(answer.trim())
                .map_err(|e| anyhow::anyhow!("SEED_PRICES answer '{answer}' is invalid: {e}"))?;
            Ok((feed, answer))
        })
        .collect()
}
