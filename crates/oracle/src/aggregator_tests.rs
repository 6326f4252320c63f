//! Decoder and price book tests against realistic aggregator logs.
//!
//! Logs are built with the same layout an EVM node returns: indexed
//! `int256`/`uint256` arguments in topics, `updatedAt` in data.

use alloy::primitives::{Address, B256, Bytes, I256, Log, LogData, U256, keccak256};

use crate::{AnswerUpdatedDecoder, PriceBook, PriceOracle};

// ───────────────────────────── helpers ──────────────────────────────

fn build_log(topics: Vec<B256>, data: Vec<u8>, address: Address) -> Log {
    Log {
        address,
        data: LogData::new(topics, Bytes::from(data)).expect("valid log data"),
    }
}

fn encode_u256(val: u64) -> [u8; 32] {
    U256::from(val).to_be_bytes::<32>()
}

fn encode_i256(val: i64) -> B256 {
    B256::from(I256::try_from(val).unwrap().into_raw().to_be_bytes::<32>())
}

fn answer_updated(feed: Address, answer: i64, round: u64, updated_at: u64) -> Log {
    build_log(
        vec![
            keccak256("AnswerUpdated(int256,uint256,uint256)"),
            encode_i256(answer),
            B256::from(encode_u256(round)),
        ],
        encode_u256(updated_at).to_vec(),
        feed,
    )
}

fn eth_usd() -> Address {
    Address::repeat_byte(0xE7)
}

// ═══════════════════════════════════════════════════════════════════
//  AnswerUpdated decoding
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_decode_answer_updated() {
    let decoder = AnswerUpdatedDecoder::new();
    let log = answer_updated(eth_usd(), 4_000_00000000, 42, 1_700_000_000);

    let update = decoder.decode(&log).unwrap();
    assert_eq!(update.feed, eth_usd());
    assert_eq!(update.answer, I256::try_from(4_000_00000000i64).unwrap());
    assert_eq!(update.round_id, U256::from(42u64));
    assert_eq!(update.updated_at.timestamp(), 1_700_000_000);
}

#[test]
fn test_decode_negative_answer() {
    let decoder = AnswerUpdatedDecoder::new();
    let log = answer_updated(eth_usd(), -5, 1, 1_700_000_000);

    let update = decoder.decode(&log).unwrap();
    assert!(update.answer.is_negative());
}

#[test]
fn test_unknown_topic_returns_none() {
    let decoder = AnswerUpdatedDecoder::new();
    let log = build_log(
        vec![keccak256("NewRound(uint256,address,uint256)")],
        vec![],
        eth_usd(),
    );
    assert!(decoder.decode(&log).is_none());
}

#[test]
fn test_missing_round_topic_returns_none() {
    let decoder = AnswerUpdatedDecoder::new();
    let log = build_log(
        vec![
            keccak256("AnswerUpdated(int256,uint256,uint256)"),
            encode_i256(1),
        ],
        encode_u256(1_700_000_000).to_vec(),
        eth_usd(),
    );
    assert!(decoder.decode(&log).is_none());
}

#[test]
fn test_truncated_data_returns_none() {
    let decoder = AnswerUpdatedDecoder::new();
    let mut log = answer_updated(eth_usd(), 1, 1, 1_700_000_000);
    log.data = LogData::new(log.topics().to_vec(), Bytes::from(vec![0u8; 16])).unwrap();
    assert!(decoder.decode(&log).is_none());
}

#[test]
fn test_empty_topics_returns_none() {
    let decoder = AnswerUpdatedDecoder::new();
    let log = build_log(vec![], vec![], eth_usd());
    assert!(decoder.decode(&log).is_none());
}

// ═══════════════════════════════════════════════════════════════════
//  PriceBook ingestion
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_book_ingests_log() {
    let book = PriceBook::new();
    book.set_price(eth_usd(), I256::try_from(4_000_00000000i64).unwrap(), 8);

    let update = book
        .ingest_log(&answer_updated(eth_usd(), 1_900_00000000, 43, 1_700_000_100))
        .unwrap();
    assert_eq!(update.round_id, U256::from(43u64));

    let quote = book.latest_price(eth_usd()).unwrap();
    assert_eq!(quote.price, I256::try_from(1_900_00000000i64).unwrap());
    assert_eq!(quote.decimals, 8);
    assert_eq!(quote.updated_at.timestamp(), 1_700_000_100);
}

#[test]
fn test_book_ignores_foreign_logs() {
    let book = PriceBook::new();
    let log = build_log(vec![keccak256("Transfer(address,address,uint256)")], vec![], eth_usd());
    assert!(book.ingest_log(&log).is_none());
    assert!(book.feeds().is_empty());
}

#[test]
fn test_quote_serializes() {
    let book = PriceBook::new();
    book.set_price(eth_usd(), I256::try_from(1i64).unwrap(), 8);
    let json = serde_json::to_value(book.quote(eth_usd()).unwrap()).unwrap();
    assert_eq!(json["decimals"], 8);
    assert!(json.get("updated_at").is_some());
}
