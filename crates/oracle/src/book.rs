//! In-memory price book holding the latest quote per feed.
//!
//! Cheap to clone; clones share the same quotes, so a poller task can keep
//! the book current while the engine reads from it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use alloy::primitives::{Address, I256, Log};
use chrono::Utc;

use crate::aggregator::{AnswerUpdatedDecoder, FeedUpdate};
use crate::{DEFAULT_FEED_DECIMALS, OracleError, PriceOracle, PriceQuote};

#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    quotes: Arc<RwLock<HashMap<Address, PriceQuote>>>,
    decoder: AnswerUpdatedDecoder,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer for a feed, stamped with the current time.
    pub fn set_price(&self, feed: Address, price: I256, decimals: u8) {
        self.set_quote(
            feed,
            PriceQuote {
                price,
                decimals,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn set_quote(&self, feed: Address, quote: PriceQuote) {
        self.write().insert(feed, quote);
    }

    /// Apply an aggregator update. The feed keeps the decimals it was seeded
    /// with; feeds seen for the first time get [`DEFAULT_FEED_DECIMALS`].
    pub fn apply(&self, update: &FeedUpdate) -> PriceQuote {
        let mut quotes = self.write();
        let decimals = quotes
            .get(&update.feed)
            .map(|q| q.decimals)
            .unwrap_or(DEFAULT_FEED_DECIMALS);
        let quote = PriceQuote {
            price: update.answer,
            decimals,
            updated_at: update.updated_at,
        };
        quotes.insert(update.feed, quote);
        quote
    }

    /// Decode an `AnswerUpdated` log and apply it. Other logs are ignored.
    pub fn ingest_log(&self, log: &Log) -> Option<FeedUpdate> {
        let update = self.decoder.decode(log)?;
        self.apply(&update);
        Some(update)
    }

    pub fn quote(&self, feed: Address) -> Option<PriceQuote> {
        self.read().get(&feed).copied()
    }

    /// Feeds with a recorded quote.
    pub fn feeds(&self) -> Vec<Address> {
        self.read().keys().copied().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Address, PriceQuote>> {
        self.quotes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Address, PriceQuote>> {
        self.quotes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PriceOracle for PriceBook {
    fn latest_price(&self, feed: Address) -> Result<PriceQuote, OracleError> {
        self.quote(feed).ok_or(OracleError::UnknownFeed(feed))
    }
}
