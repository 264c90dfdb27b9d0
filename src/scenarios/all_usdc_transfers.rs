//! `Transfer` events emitted by the USDC token contract

use crate::query::{FieldSelection, LogField, LogSelection, Query, StreamConfig};
use crate::types::DataCategory;

use super::TRANSFER_TOPIC;

pub const USDC_CONTRACT_ADDRESS: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

pub const EVENT_SIGNATURE: &str = "Transfer(address indexed from, address indexed to, uint256 value)";

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[DataCategory::Logs];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        logs: vec![LogSelection::topic0(TRANSFER_TOPIC).with_address(USDC_CONTRACT_ADDRESS)],
        field_selection: FieldSelection {
            log: vec![
                LogField::TransactionHash,
                LogField::BlockNumber,
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
