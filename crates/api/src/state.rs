//! Shared application state for the Axum API server.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::Mutex;

use pegvault_common::config::AppConfig;
use pegvault_common::error::EngineError;
use pegvault_engine::{CollateralRegistry, InMemoryToken, PegEngine, TokenLedger};
use pegvault_oracle::PriceBook;

/// Application state shared across all route handlers via Axum `State`.
///
/// Engine operations are serialized through the mutex; reads take the same
/// lock so they never observe a half-applied operation.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<PegEngine>>,
    pub prices: PriceBook,
    /// Collateral token per asset, for balances and the faucet
    pub collateral: Arc<HashMap<Address, InMemoryToken>>,
    pub peg: InMemoryToken,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        engine: PegEngine,
        prices: PriceBook,
        collateral: HashMap<Address, InMemoryToken>,
        peg: InMemoryToken,
        config: AppConfig,
    ) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            prices,
            collateral: Arc::new(collateral),
            peg,
            config,
        }
    }

    /// Wire an engine over in-memory tokens for every configured asset, with
    /// the price book seeded from `SEED_PRICES`.
    pub fn sandbox(config: AppConfig) -> Result<Self, EngineError> {
        let prices = PriceBook::new();
        for (feed, answer) in &config.seed_prices {
            prices.set_price(*feed, *answer, config.price_feed_decimals);
        }

        let collateral: HashMap<Address, InMemoryToken> = config
            .collateral_tokens
            .iter()
            .map(|asset| (*asset, InMemoryToken::new(*asset)))
            .collect();

        let registry = CollateralRegistry::from_addresses(
            &config.collateral_tokens,
            &config.price_feeds,
            |asset| {
                let token = collateral
                    .get(&asset)
                    .cloned()
                    .unwrap_or_else(|| InMemoryToken::new(asset));
                Arc::new(token) as Arc<dyn TokenLedger>
            },
        )?;

        let peg = InMemoryToken::mintable(config.peg_token_address, config.custody_address);
        let engine = PegEngine::builder(
            Arc::new(prices.clone()),
            config.peg_token_address,
            Arc::new(peg.clone()),
            config.custody_address,
        )
        .registry(registry)
        .build()?;

        Ok(Self::new(engine, prices, collateral, peg, config))
    }

    pub fn collateral_token(&self, asset: Address) -> Option<&InMemoryToken> {
        self.collateral.get(&asset)
    }
}
