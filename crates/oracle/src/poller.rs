//! RPC feed poller. Keeps a [`PriceBook`] in step with on-chain aggregators.
//!
//! On start it seeds the book from `latestRoundData()`, then follows
//! `AnswerUpdated` logs from the configured feeds block range by block range.
//! No staleness or deviation checks are applied; the book simply mirrors the
//! latest answer each feed published.

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use alloy::sol;
use chrono::Utc;

use crate::aggregator::{AnswerUpdatedDecoder, timestamp_from_secs};
use crate::{DEFAULT_FEED_DECIMALS, PriceBook, PriceQuote};

// Only the views the poller needs.
sol! {
    #[sol(rpc)]
    interface AggregatorV3Interface {
        function decimals() external view returns (uint8);
        function latestRoundData()
            external
            view
            returns (
                uint80 roundId,
                int256 answer,
                uint256 startedAt,
                uint256 updatedAt,
                uint80 answeredInRound
            );
    }
}

pub struct FeedPoller {
    rpc_url: String,
    poll_interval: Duration,
    feeds: Vec<Address>,
    book: PriceBook,
    decoder: AnswerUpdatedDecoder,
    default_decimals: u8,
}

impl FeedPoller {
    pub fn new(
        rpc_url: String,
        poll_interval_ms: u64,
        feeds: Vec<Address>,
        book: PriceBook,
    ) -> Self {
        Self {
            rpc_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            feeds,
            book,
            decoder: AnswerUpdatedDecoder::new(),
            default_decimals: DEFAULT_FEED_DECIMALS,
        }
    }

    /// Decimals to assume when a feed's `decimals()` call fails.
    pub fn with_default_decimals(mut self, decimals: u8) -> Self {
        self.default_decimals = decimals;
        self
    }

    pub fn feeds(&self) -> &[Address] {
        &self.feeds
    }

    /// Start the polling loop. Runs until the task is cancelled.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.parse()?);

        let seeded = self.snapshot(&provider).await;
        let mut next_block = provider.get_block_number().await? + 1;

        tracing::info!(
            feeds = self.feeds.len(),
            seeded,
            start_block = next_block,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Feed poller started"
        );

        loop {
            match self.poll_range(&provider, next_block).await {
                Ok(Some(last)) => next_block = last + 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        from_block = next_block,
                        error = %e,
                        "Feed poll failed, retrying"
                    );
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Read the current round of every feed into the book.
    /// Returns how many feeds were seeded.
    pub async fn snapshot(&self, provider: &(impl Provider + Clone)) -> usize {
        let mut seeded = 0;

        for feed in &self.feeds {
            let aggregator = AggregatorV3Interface::new(*feed, provider.clone());

            let decimals = match aggregator.decimals().call().await {
                Ok(decimals) => decimals,
                Err(e) => {
                    tracing::warn!(
                        feed = %feed,
                        error = %e,
                        default = self.default_decimals,
                        "Feed did not report decimals"
                    );
                    self.default_decimals
                }
            };

            match aggregator.latestRoundData().call().await {
                Ok(round) => {
                    let quote = PriceQuote {
                        price: round.answer,
                        decimals,
                        updated_at: timestamp_from_secs(round.updatedAt).unwrap_or_else(Utc::now),
                    };
                    self.book.set_quote(*feed, quote);
                    tracing::info!(feed = %feed, price = %quote.price, decimals, "Seeded feed");
                    seeded += 1;
                }
                Err(e) => {
                    tracing::warn!(feed = %feed, error = %e, "Failed to read latest round");
                }
            }
        }

        seeded
    }

    /// Apply every `AnswerUpdated` log from `from_block` up to the chain head.
    /// Returns the last block covered, or `None` when the head has not advanced.
    async fn poll_range(
        &self,
        provider: &impl Provider,
        from_block: u64,
    ) -> anyhow::Result<Option<u64>> {
        let latest = provider.get_block_number().await?;
        if latest < from_block || self.feeds.is_empty() {
            return Ok(None);
        }

        let filter = Filter::new()
            .address(self.feeds.clone())
            .event_signature(self.decoder.event_signature())
            .from_block(from_block)
            .to_block(latest);

        let logs = provider.get_logs(&filter).await?;

        for log in &logs {
            if let Some(update) = self.book.ingest_log(&log.inner) {
                tracing::info!(
                    feed = %update.feed,
                    answer = %update.answer,
                    round_id = %update.round_id,
                    block = ?log.block_number,
                    "Price updated"
                );
            }
        }

        Ok(Some(latest))
    }
}
