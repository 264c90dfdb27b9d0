use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One record as returned by the service: field name to JSON value.
pub type Record = Map<String, Value>;

/// Data categories a query can target and a run can report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    Logs,
    Transactions,
    Blocks,
    Traces,
    DecodedLogs,
}

impl DataCategory {
    /// Categories that arrive on the wire. `DecodedLogs` is derived locally.
    pub const STREAMED: [DataCategory; 4] = [
        DataCategory::Logs,
        DataCategory::Transactions,
        DataCategory::Blocks,
        DataCategory::Traces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::Logs => "logs",
            DataCategory::Transactions => "transactions",
            DataCategory::Blocks => "blocks",
            DataCategory::Traces => "traces",
            DataCategory::DecodedLogs => "decoded_logs",
        }
    }

    /// Parquet file name for this category inside a results directory
    pub fn file_name(&self) -> String {
        format!("{}.parquet", self.as_str())
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chunk of streamed results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub logs: Vec<Record>,
    pub transactions: Vec<Record>,
    pub blocks: Vec<Record>,
    pub traces: Vec<Record>,
    /// Block the next page starts at
    pub next_block: u64,
}

impl Batch {
    pub fn records(&self, category: DataCategory) -> &[Record] {
        match category {
            DataCategory::Logs => &self.logs,
            DataCategory::Transactions => &self.transactions,
            DataCategory::Blocks => &self.blocks,
            DataCategory::Traces => &self.traces,
            DataCategory::DecodedLogs => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        DataCategory::STREAMED
            .iter()
            .all(|category| self.records(*category).is_empty())
    }

    pub fn total_items(&self) -> usize {
        DataCategory::STREAMED
            .iter()
            .map(|category| self.records(*category).len())
            .sum()
    }

    pub(crate) fn extend(&mut self, other: Batch) {
        self.logs.extend(other.logs);
        self.transactions.extend(other.transactions);
        self.blocks.extend(other.blocks);
        self.traces.extend(other.traces);
        self.next_block = self.next_block.max(other.next_block);
    }

    pub(crate) fn reverse(&mut self) {
        self.logs.reverse();
        self.transactions.reverse();
        self.blocks.reverse();
        self.traces.reverse();
    }
}
