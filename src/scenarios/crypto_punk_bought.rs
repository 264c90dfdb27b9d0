//! `PunkBought` events from the CryptoPunks market

use crate::query::{FieldSelection, LogField, LogSelection, Query, StreamConfig};
use crate::types::DataCategory;

/// keccak256("PunkBought(uint256,uint256,address,address)")
pub const PUNK_BOUGHT_TOPIC: &str =
    "0x58e5d5a525e3b40bc15abaa38b5882678db1ee68befd2f60bafe3a7fd06db9e3";

pub const EVENT_SIGNATURE: &str = "PunkBought(uint256 indexed punkIndex, uint256 value, address indexed fromAddress, address indexed toAddress)";

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[DataCategory::Logs];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        logs: vec![LogSelection::topic0(PUNK_BOUGHT_TOPIC)],
        field_selection: FieldSelection {
            log: vec![
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
    StreamConfig::prefixed().with_event_signature(EVENT_SIGNATURE)
}
