//! Every trace in the window

use crate::query::{FieldSelection, Query, StreamConfig, TraceField, TraceSelection};
use crate::types::DataCategory;

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[DataCategory::Traces];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        traces: vec![TraceSelection::default()],
        field_selection: FieldSelection {
            trace: TraceField::ALL.to_vec(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn streaming_config() -> StreamConfig {
    StreamConfig::prefixed()
}
