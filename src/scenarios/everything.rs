//! Logs, transactions, traces and block headers in one query

use crate::query::{
    BlockSelection, FieldSelection, LogField, LogSelection, Query, StreamConfig, TraceField,
    TraceSelection, TransactionField, TransactionSelection,
};
use crate::types::DataCategory;

use super::all_blocks_data::MAINNET_BLOCK_FIELDS;

pub const FETCHED_DATA_TYPES: &[DataCategory] = &[
    DataCategory::Logs,
    DataCategory::Transactions,
    DataCategory::Traces,
    DataCategory::Blocks,
];

pub fn create_query(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block,
        logs: vec![LogSelection::all()],
        transactions: vec![TransactionSelection::default()],
        traces: vec![TraceSelection::default()],
        blocks: vec![BlockSelection::default()],
        include_all_blocks: true,
        field_selection: FieldSelection {
            log: LogField::ALL.to_vec(),
            // L1 fee fields only exist on rollups
            transaction: vec![
                TransactionField::BlockHash,
                TransactionField::BlockNumber,
                TransactionField::From,
                TransactionField::Gas,
                TransactionField::GasPrice,
                TransactionField::Hash,
                TransactionField::Input,
                TransactionField::Nonce,
                TransactionField::To,
                TransactionField::TransactionIndex,
                TransactionField::Value,
                TransactionField::V,
                TransactionField::R,
                TransactionField::S,
                TransactionField::YParity,
                TransactionField::MaxPriorityFeePerGas,
                TransactionField::MaxFeePerGas,
                TransactionField::ChainId,
                TransactionField::AccessList,
                TransactionField::MaxFeePerBlobGas,
                TransactionField::BlobVersionedHashes,
                TransactionField::CumulativeGasUsed,
                TransactionField::EffectiveGasPrice,
                TransactionField::GasUsed,
                TransactionField::ContractAddress,
                TransactionField::LogsBloom,
                TransactionField::Kind,
                TransactionField::Root,
                TransactionField::Status,
            ],
            block: MAINNET_BLOCK_FIELDS.to_vec(),
            trace: TraceField::ALL.to_vec(),
        },
    }
}

pub fn streaming_config() -> StreamConfig {
    StreamConfig::prefixed()
}
