//! Every block header, including blocks without matching data

use crate::query::{BlockField, BlockSelection, FieldSelection, Query, StreamConfig};
use crate::types::DataCategory;

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[DataCategory::Blocks];

/// Header fields present on Ethereum mainnet. The Arbitrum-style
/// `l1_block_number`, `send_count` and `send_root` are left out.
pub(super) const MAINNET_BLOCK_FIELDS: &[BlockField] = &[
    BlockField::Number,
    BlockField::Hash,
    BlockField::ParentHash,
    BlockField::Nonce,
    BlockField::Sha3Uncles,
    BlockField::LogsBloom,
    BlockField::TransactionsRoot,
    BlockField::StateRoot,
    BlockField::ReceiptsRoot,
    BlockField::Miner,
    BlockField::Difficulty,
    BlockField::TotalDifficulty,
    BlockField::ExtraData,
    BlockField::Size,
    BlockField::GasLimit,
    BlockField::GasUsed,
    BlockField::Timestamp,
    BlockField::Uncles,
    BlockField::BaseFeePerGas,
    BlockField::BlobGasUsed,
    BlockField::ExcessBlobGas,
    BlockField::ParentBeaconBlockRoot,
    BlockField::WithdrawalsRoot,
    BlockField::Withdrawals,
    BlockField::MixHash,
];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        blocks: vec![BlockSelection::default()],
        include_all_blocks: true,
        field_selection: FieldSelection {
            block: MAINNET_BLOCK_FIELDS.to_vec(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn streaming_config() -> StreamConfig {
    StreamConfig::prefixed()
}
