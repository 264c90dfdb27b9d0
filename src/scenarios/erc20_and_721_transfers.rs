//! ERC-20 and ERC-721 `Transfer` events from any contract
//!
//! Both standards share the same topic0 and differ only in how many
//! arguments are indexed, so no single inline event signature fits. The
//! `decoded` modification hands both shapes to the decoder, which picks one
//! per log by topic count.

use crate::query::{FieldSelection, LogField, LogSelection, Query, StreamConfig};
use crate::types::DataCategory;

use super::TRANSFER_TOPIC;

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[DataCategory::Logs];

pub const DECODE_SIGNATURES: &[&str] = &[
    "Transfer(address indexed from, address indexed to, uint256 value)",
    "Transfer(address indexed from, address indexed to, uint256 indexed tokenId)",
];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        logs: vec![LogSelection::topic0(TRANSFER_TOPIC)],
        field_selection: FieldSelection {
            log: vec![
                LogField::TransactionHash,
                LogField::BlockNumber,
                LogField::Address,
                LogField::Data,
                LogField::Topic0,
                LogField::Topic1,
                LogField::Topic2,
                LogField::Topic3,
            ],
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn streaming_config() -> StreamConfig {
    StreamConfig::prefixed()
}
