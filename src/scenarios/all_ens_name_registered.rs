//! `NameRegistered` events from the ENS base registrar

use crate::query::{FieldSelection, LogField, LogSelection, Query, StreamConfig};
use crate::types::DataCategory;

pub const ENS_BASE_REGISTRAR_ADDRESS: &str = "0x57f1887a8BF19b14fC0dF6Fd9B2acc9Af147eA85";

/// keccak256("NameRegistered(uint256,address,uint256)")
pub const NAME_REGISTERED_TOPIC: &str =
    "0xb3d987963d01b2f68493b4bdb130988f157ea43070d4ad840fee0466ed9370d9";

pub const EVENT_SIGNATURE: &str =
    "NameRegistered(uint256 indexed id, address indexed owner, uint256 expires)";

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[DataCategory::Logs];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        logs: vec![
            LogSelection::topic0(NAME_REGISTERED_TOPIC).with_address(ENS_BASE_REGISTRAR_ADDRESS),
        ],
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
