//! Accepted collateral assets, in registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use pegvault_common::error::EngineError;
use pegvault_common::types::AssetConfig;

use crate::token::TokenLedger;

/// One accepted asset: its price feed and the ledger that moves it.
#[derive(Clone)]
pub struct CollateralListing {
    pub config: AssetConfig,
    pub token: Arc<dyn TokenLedger>,
}

impl fmt::Debug for CollateralListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollateralListing")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Fixed after engine construction.
#[derive(Debug, Clone, Default)]
pub struct CollateralRegistry {
    order: Vec<Address>,
    listings: HashMap<Address, CollateralListing>,
}

impl CollateralRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parallel asset and feed lists. `token_for` supplies the
    /// ledger handle of each asset.
    pub fn from_addresses(
        assets: &[Address],
        price_feeds: &[Address],
        mut token_for: impl FnMut(Address) -> Arc<dyn TokenLedger>,
    ) -> Result<Self, EngineError> {
        if assets.len() != price_feeds.len() {
            return Err(EngineError::Config(format!(
                "{} collateral assets but {} price feeds",
                assets.len(),
                price_feeds.len()
            )));
        }

        let mut registry = Self::new();
        for (asset, feed) in assets.iter().zip(price_feeds) {
            registry.register(*asset, *feed, token_for(*asset))?;
        }
        Ok(registry)
    }

    pub fn register(
        &mut self,
        asset: Address,
        price_feed: Address,
        token: Arc<dyn TokenLedger>,
    ) -> Result<(), EngineError> {
        if asset == Address::ZERO {
            return Err(EngineError::Config(
                "collateral asset cannot be the zero address".to_string(),
            ));
        }
        if self.listings.contains_key(&asset) {
            return Err(EngineError::Config(format!("collateral asset {asset} registered twice")));
        }

        self.order.push(asset);
        self.listings.insert(
            asset,
            CollateralListing {
                config: AssetConfig { asset, price_feed },
                token,
            },
        );
        Ok(())
    }

    pub fn listing(&self, asset: Address) -> Result<&CollateralListing, EngineError> {
        self.listings.get(&asset).ok_or(EngineError::UnsupportedAsset(asset))
    }

    pub fn is_allowed(&self, asset: Address) -> bool {
        self.listings.contains_key(&asset)
    }

    pub fn price_feed(&self, asset: Address) -> Option<Address> {
        self.listings.get(&asset).map(|l| l.config.price_feed)
    }

    /// Assets in registration order.
    pub fn assets(&self) -> &[Address] {
        &self.order
    }

    pub fn configs(&self) -> Vec<AssetConfig> {
        self.order
            .iter()
            .filter_map(|a| self.listings.get(a).map(|l| l.config))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
