//! Every log in the window

use crate::query::{FieldSelection, LogField, LogSelection, Query, StreamConfig};
use crate::types::DataCategory;

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[DataCategory::Logs];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        logs: vec![LogSelection::all()],
        field_selection: FieldSelection {
            // `removed` is always false for finalized history
            log: vec![
                LogField::LogIndex,
                LogField::TransactionIndex,
                LogField::TransactionHash,
                LogField::BlockHash,
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
