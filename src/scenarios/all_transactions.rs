//! Every transaction with its receipt fields

use crate::query::{FieldSelection, Query, StreamConfig, TransactionField, TransactionSelection};
use crate::types::DataCategory;

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[DataCategory::Transactions];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        transactions: vec![TransactionSelection::default()],
        field_selection: FieldSelection {
            transaction: TransactionField::ALL.to_vec(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn streaming_config() -> StreamConfig {
    StreamConfig::prefixed()
}
