//! Price oracle adapters consumed by the accounting engine.
//!
//! The engine only sees the [`PriceOracle`] trait. [`PriceBook`] is the
//! in-process implementation; it can be seeded statically or kept current by
//! [`poller::FeedPoller`], which follows Chainlink-style aggregators over RPC.

pub mod aggregator;
pub mod book;
pub mod poller;

#[cfg(test)]
mod aggregator_tests;

use alloy::primitives::{Address, I256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use aggregator::{AnswerUpdatedDecoder, FeedUpdate};
pub use book::PriceBook;

/// Decimals assumed for USD feeds that do not report their own.
pub const DEFAULT_FEED_DECIMALS: u8 = 8;

/// Latest answer reported by a price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Signed answer scaled by `10^decimals`
    pub price: I256,
    pub decimals: u8,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("No price recorded for feed {0}")]
    UnknownFeed(Address),

    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Source of unit prices, keyed by price feed address.
///
/// Implementations are trusted. Callers do not check freshness or sign.
pub trait PriceOracle: Send + Sync {
    fn latest_price(&self, feed: Address) -> Result<PriceQuote, OracleError>;
}
