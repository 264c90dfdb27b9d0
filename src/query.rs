//! Query model sent to the HyperSync JSON endpoint
//!
//! Mirrors the service's request body: block range, per-category selections
//! and the explicit list of fields wanted per category. The field list is
//! the contract for which keys appear in every returned record.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::types::DataCategory;

macro_rules! field_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Column name used by the service and in Parquet output
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

field_enum!(
    /// Log fields
    LogField {
        Removed => "removed",
        LogIndex => "log_index",
        TransactionIndex => "transaction_index",
        TransactionHash => "transaction_hash",
        BlockHash => "block_hash",
        BlockNumber => "block_number",
        Address => "address",
        Data => "data",
        Topic0 => "topic0",
        Topic1 => "topic1",
        Topic2 => "topic2",
        Topic3 => "topic3",
    }
);

field_enum!(
    /// Transaction and receipt fields
    TransactionField {
        BlockHash => "block_hash",
        BlockNumber => "block_number",
        From => "from",
        Gas => "gas",
        GasPrice => "gas_price",
        Hash => "hash",
        Input => "input",
        Nonce => "nonce",
        To => "to",
        TransactionIndex => "transaction_index",
        Value => "value",
        V => "v",
        R => "r",
        S => "s",
        YParity => "y_parity",
        MaxPriorityFeePerGas => "max_priority_fee_per_gas",
        MaxFeePerGas => "max_fee_per_gas",
        ChainId => "chain_id",
        AccessList => "access_list",
        MaxFeePerBlobGas => "max_fee_per_blob_gas",
        BlobVersionedHashes => "blob_versioned_hashes",
        CumulativeGasUsed => "cumulative_gas_used",
        EffectiveGasPrice => "effective_gas_price",
        GasUsed => "gas_used",
        ContractAddress => "contract_address",
        LogsBloom => "logs_bloom",
        Kind => "type",
        Root => "root",
        Status => "status",
        L1Fee => "l1_fee",
        L1GasPrice => "l1_gas_price",
        L1GasUsed => "l1_gas_used",
        L1FeeScalar => "l1_fee_scalar",
        GasUsedForL1 => "gas_used_for_l1",
    }
);

field_enum!(
    /// Block header fields
    BlockField {
        Number => "number",
        Hash => "hash",
        ParentHash => "parent_hash",
        Nonce => "nonce",
        Sha3Uncles => "sha3_uncles",
        LogsBloom => "logs_bloom",
        TransactionsRoot => "transactions_root",
        StateRoot => "state_root",
        ReceiptsRoot => "receipts_root",
        Miner => "miner",
        Difficulty => "difficulty",
        TotalDifficulty => "total_difficulty",
        ExtraData => "extra_data",
        Size => "size",
        GasLimit => "gas_limit",
        GasUsed => "gas_used",
        Timestamp => "timestamp",
        Uncles => "uncles",
        BaseFeePerGas => "base_fee_per_gas",
        BlobGasUsed => "blob_gas_used",
        ExcessBlobGas => "excess_blob_gas",
        ParentBeaconBlockRoot => "parent_beacon_block_root",
        WithdrawalsRoot => "withdrawals_root",
        Withdrawals => "withdrawals",
        L1BlockNumber => "l1_block_number",
        SendCount => "send_count",
        SendRoot => "send_root",
        MixHash => "mix_hash",
    }
);

field_enum!(
    /// Trace fields
    TraceField {
        From => "from",
        To => "to",
        CallType => "call_type",
        Gas => "gas",
        Input => "input",
        Init => "init",
        Value => "value",
        Author => "author",
        RewardType => "reward_type",
        BlockHash => "block_hash",
        BlockNumber => "block_number",
        Address => "address",
        Code => "code",
        GasUsed => "gas_used",
        Output => "output",
        Subtraces => "subtraces",
        TraceAddress => "trace_address",
        TransactionHash => "transaction_hash",
        TransactionPosition => "transaction_position",
        Kind => "type",
        Error => "error",
    }
);

/// Log filter. An empty selection matches every log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogSelection {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<String>,
    /// One list of accepted values per topic position
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<Vec<String>>,
}

impl LogSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn topic0(topic: &str) -> Self {
        Self {
            address: Vec::new(),
            topics: vec![vec![topic.to_string()]],
        }
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address.push(address.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionSelection {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sighash: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceSelection {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockSelection {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hash: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub miner: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSelection {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub block: Vec<BlockField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transaction: Vec<TransactionField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<LogField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceField>,
}

impl FieldSelection {
    /// Selected column names for a streamed category, in request order
    pub fn columns(&self, category: DataCategory) -> Vec<&'static str> {
        match category {
            DataCategory::Logs => self.log.iter().map(LogField::as_str).collect(),
            DataCategory::Transactions => {
                self.transaction.iter().map(TransactionField::as_str).collect()
            }
            DataCategory::Blocks => self.block.iter().map(BlockField::as_str).collect(),
            DataCategory::Traces => self.trace.iter().map(TraceField::as_str).collect(),
            DataCategory::DecodedLogs => Vec::new(),
        }
    }
}

/// Request over the half-open block range `[from_block, to_block)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Query {
    pub from_block: u64,
    pub to_block: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogSelection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TransactionSelection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<TraceSelection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockSelection>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_all_blocks: bool,
    pub field_selection: FieldSelection,
}

impl Query {
    /// Same query restricted to another block range
    pub fn with_range(&self, from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            ..self.clone()
        }
    }

    /// Streamed categories that will carry columns in the response
    pub fn requested_categories(&self) -> Vec<DataCategory> {
        DataCategory::STREAMED
            .into_iter()
            .filter(|category| !self.field_selection.columns(*category).is_empty())
            .collect()
    }
}

/// How hex-encoded values are rendered in returned records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexOutput {
    /// Leave values exactly as the service sent them
    #[default]
    NoEncode,
    /// `0x`-prefixed hex strings
    Prefixed,
    /// Hex strings without the `0x` prefix
    NonPrefixed,
}

impl HexOutput {
    /// The service already sends `0x`-prefixed hex, so `Prefixed` leaves
    /// strings alone; a bare word such as `add` is never turned into hex.
    pub fn render(&self, value: &str) -> String {
        match self {
            HexOutput::NoEncode | HexOutput::Prefixed => value.to_string(),
            HexOutput::NonPrefixed => match value.strip_prefix("0x") {
                Some(stripped) if is_hex(stripped) => stripped.to_string(),
                _ => value.to_string(),
            },
        }
    }

    /// Rewrites every string inside `value`, descending into arrays and objects
    pub fn render_value(&self, value: &mut serde_json::Value) {
        match value {
            serde_json::Value::String(s) => *s = self.render(s),
            serde_json::Value::Array(items) => items.iter_mut().for_each(|item| self.render_value(item)),
            serde_json::Value::Object(map) => map.values_mut().for_each(|item| self.render_value(item)),
            _ => {}
        }
    }
}

fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Options controlling how results are streamed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Deliver newest blocks first
    pub reverse: bool,
    pub hex_output: HexOutput,
    /// Event decoded into `decoded_logs` when collecting to Parquet
    pub event_signature: Option<String>,
    /// Upper bound on blocks covered by a single request
    pub max_blocks_per_request: u64,
    /// Pages buffered between the fetch task and the consumer
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reverse: false,
            hex_output: HexOutput::NoEncode,
            event_signature: None,
            max_blocks_per_request: 10_000,
            channel_capacity: 16,
        }
    }
}

impl StreamConfig {
    pub fn prefixed() -> Self {
        Self {
            hex_output: HexOutput::Prefixed,
            ..Self::default()
        }
    }

    pub fn with_event_signature(mut self, signature: &str) -> Self {
        self.event_signature = Some(signature.to_string());
        self
    }
}
