use alloy::primitives::{Address, B256, I256, Log, U256, keccak256};
use chrono::{DateTime, Utc};

/// A new answer published by an aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedUpdate {
    /// Aggregator contract that emitted the log
    pub feed: Address,
    pub answer: I256,
    pub round_id: U256,
    pub updated_at: DateTime<Utc>,
}

/// Chainlink-style aggregator event decoder.
///
/// Handles `AnswerUpdated(int256 indexed current, uint256 indexed roundId, uint256 updatedAt)`.
#[derive(Debug, Clone, Copy)]
pub struct AnswerUpdatedDecoder {
    answer_updated: B256,
}

impl AnswerUpdatedDecoder {
    pub fn new() -> Self {
        Self {
            answer_updated: keccak256("AnswerUpdated(int256,uint256,uint256)"),
        }
    }

    /// Topic0 of the handled event, for log filters.
    pub fn event_signature(&self) -> B256 {
        self.answer_updated
    }

    /// Decode a raw log. Returns `None` for other events or truncated logs.
    pub fn decode(&self, log: &Log) -> Option<FeedUpdate> {
        let topics = log.topics();
        if *topics.first()? != self.answer_updated {
            return None;
        }

        let answer = I256::from_raw(U256::from_be_bytes(topics.get(1)?.0));
        let round_id = U256::from_be_bytes(topics.get(2)?.0);
        let updated_at = Self::decode_timestamp(log.data.data.as_ref())?;

        tracing::debug!(
            feed = %log.address,
            answer = %answer,
            round_id = %round_id,
            "Decoded AnswerUpdated"
        );

        Some(FeedUpdate {
            feed: log.address,
            answer,
            round_id,
            updated_at,
        })
    }

    fn decode_timestamp(data: &[u8]) -> Option<DateTime<Utc>> {
        let bytes: [u8; 32] = data.get(..32)?.try_into().ok()?;
        timestamp_from_secs(U256::from_be_bytes(bytes))
    }
}

impl Default for AnswerUpdatedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an on-chain `uint256` unix timestamp.
pub(crate) fn timestamp_from_secs(secs: U256) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(u64::try_from(secs).ok()?).ok()?;
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_signature() {
        let decoder = AnswerUpdatedDecoder::new();
        assert_eq!(
            decoder.event_signature(),
            keccak256("AnswerUpdated(int256,uint256,uint256)")
        );
    }

    #[test]
    fn test_timestamp_out_of_range() {
        assert!(timestamp_from_secs(U256::MAX).is_none());
        assert_eq!(
            timestamp_from_secs(U256::from(1_700_000_000u64))
                .unwrap()
                .timestamp(),
            1_700_000_000
        );
    }
}
