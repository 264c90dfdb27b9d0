//! Benchmark scenario registry

mod all_blocks_data;
mod all_ens_name_registered;
mod all_logs;
mod all_traces;
mod all_transactions;
mod all_usdc_transfers;
mod crypto_punk_bought;
mod erc20_and_721_transfers;
mod everything;

use crate::error::{BenchError, Result};
use crate::query::{Query, StreamConfig};
use crate::types::DataCategory;

/// keccak256("Transfer(address,address,uint256)"), shared by ERC-20 and ERC-721
pub const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// A named benchmark: how to build the query, how to stream it and what
/// comes back.
#[derive(Debug)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    build_query: fn(u64, u64) -> Query,
    build_stream_config: fn() -> StreamConfig,
    fetched_data_types: &'static [DataCategory],
    decode_signatures: &'static [&'static str],
}

impl Scenario {
    pub fn build_query(&self, from_block: u64, to_block: u64) -> Query {
        (self.build_query)(from_block, to_block)
    }

    pub fn stream_config(&self) -> StreamConfig {
        (self.build_stream_config)()
    }

    /// Categories reported for a run. The bulk variant also writes
    /// `decoded_logs` when the stream config carries an event signature.
    pub fn expected_categories(&self, bulk: bool) -> Vec<DataCategory> {
        let mut categories = self.fetched_data_types.to_vec();
        if bulk && self.stream_config().event_signature.is_some() {
            categories.push(DataCategory::DecodedLogs);
        }
        categories
    }

    /// Signatures used by the `decoded` modification. Falls back to the
    /// stream config's inline signature.
    pub fn decode_signatures(&self) -> Vec<String> {
        if !self.decode_signatures.is_empty() {
            return self.decode_signatures.iter().map(|s| s.to_string()).collect();
        }
        self.stream_config().event_signature.into_iter().collect()
    }
}

const NO_SIGNATURES: &[&str] = &[];

static SCENARIOS: [Scenario; 9] = [
    Scenario {
        name: "all-logs",
        description: "Every log with all log fields",
        build_query: all_logs::create_query,
        build_stream_config: all_logs::streaming_config,
        fetched_data_types: all_logs::FETCHED_DATA_TYPES,
        decode_signatures: NO_SIGNATURES,
    },
    Scenario {
        name: "all-transactions",
        description: "Every transaction with receipt fields",
        build_query: all_transactions::create_query,
        build_stream_config: all_transactions::streaming_config,
        fetched_data_types: all_transactions::FETCHED_DATA_TYPES,
        decode_signatures: NO_SIGNATURES,
    },
    Scenario {
        name: "all-blocks-data",
        description: "Every block header",
        build_query: all_blocks_data::create_query,
        build_stream_config: all_blocks_data::streaming_config,
        fetched_data_types: all_blocks_data::FETCHED_DATA_TYPES,
        decode_signatures: NO_SIGNATURES,
    },
    Scenario {
        name: "all-traces",
        description: "Every trace",
        build_query: all_traces::create_query,
        build_stream_config: all_traces::streaming_config,
        fetched_data_types: all_traces::FETCHED_DATA_TYPES,
        decode_signatures: NO_SIGNATURES,
    },
    Scenario {
        name: "erc-20-and-721-transfers",
        description: "ERC-20 and ERC-721 Transfer events from any contract",
        build_query: erc20_and_721_transfers::create_query,
        build_stream_config: erc20_and_721_transfers::streaming_config,
        fetched_data_types: erc20_and_721_transfers::FETCHED_DATA_TYPES,
        decode_signatures: erc20_and_721_transfers::DECODE_SIGNATURES,
    },
    Scenario {
        name: "all-usdc-transfers",
        description: "Transfer events of the USDC token",
        build_query: all_usdc_transfers::create_query,
        build_stream_config: all_usdc_transfers::streaming_config,
        fetched_data_types: all_usdc_transfers::FETCHED_DATA_TYPES,
        decode_signatures: NO_SIGNATURES,
    },
    Scenario {
        name: "all-ens-name-registered",
        description: "NameRegistered events of the ENS base registrar",
        build_query: all_ens_name_registered::create_query,
        build_stream_config: all_ens_name_registered::streaming_config,
        fetched_data_types: all_ens_name_registered::FETCHED_DATA_TYPES,
        decode_signatures: NO_SIGNATURES,
    },
    Scenario {
        name: "crypto-punk-bought",
        description: "PunkBought events of the CryptoPunks market",
        build_query: crypto_punk_bought::create_query,
        build_stream_config: crypto_punk_bought::streaming_config,
        fetched_data_types: crypto_punk_bought::FETCHED_DATA_TYPES,
        decode_signatures: NO_SIGNATURES,
    },
    Scenario {
        name: "everything",
        description: "Logs, transactions, traces and blocks together",
        build_query: everything::create_query,
        build_stream_config: everything::streaming_config,
        fetched_data_types: everything::FETCHED_DATA_TYPES,
        decode_signatures: NO_SIGNATURES,
    },
];

/// All registered scenarios in display order
pub fn all() -> &'static [Scenario] {
    &SCENARIOS
}

pub fn names() -> Vec<&'static str> {
    SCENARIOS.iter().map(|scenario| scenario.name).collect()
}

/// Find a scenario by name, ignoring ASCII case
pub fn lookup(name: &str) -> Result<&'static Scenario> {
    SCENARIOS
        .iter()
        .find(|scenario| scenario.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| BenchError::UnknownScenario {
            name: name.to_string(),
            available: names(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::HexOutput;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let scenario = lookup("ALL-Logs").unwrap();
        assert_eq!(scenario.name, "all-logs");
    }

    #[test]
    fn test_unknown_scenario_lists_available_names() {
        let err = lookup("all-the-things").unwrap_err();
        match &err {
            BenchError::UnknownScenario { name, available } => {
                assert_eq!(name, "all-the-things");
                assert_eq!(available.len(), all().len());
                assert!(available.contains(&"everything"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("all-logs"));
        assert!(message.contains("crypto-punk-bought"));
    }

    #[test]
    fn test_query_builders_are_deterministic() {
        for scenario in all() {
            let first = scenario.build_query(20_000_000, 20_100_000);
            let second = scenario.build_query(20_000_000, 20_100_000);
            assert_eq!(first, second, "scenario {} is not deterministic", scenario.name);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
            assert_eq!(first.from_block, 20_000_000);
            assert_eq!(first.to_block, 20_100_000);
        }
    }

    #[test]
    fn test_fetched_types_match_field_selection() {
        for scenario in all() {
            let query = scenario.build_query(0, 1);
            let mut requested = query.requested_categories();
            let mut expected = scenario.expected_categories(false);
            requested.sort();
            expected.sort();
            assert_eq!(requested, expected, "scenario {}", scenario.name);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = names();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_bulk_adds_decoded_logs_for_inline_signature() {
        let usdc = lookup("all-usdc-transfers").unwrap();
        assert_eq!(
            usdc.expected_categories(true),
            vec![DataCategory::Logs, DataCategory::DecodedLogs]
        );
        assert_eq!(usdc.expected_categories(false), vec![DataCategory::Logs]);

        let logs = lookup("all-logs").unwrap();
        assert_eq!(logs.expected_categories(true), vec![DataCategory::Logs]);
    }

    #[test]
    fn test_decode_signatures() {
        assert!(lookup("all-logs").unwrap().decode_signatures().is_empty());
        assert_eq!(lookup("erc-20-and-721-transfers").unwrap().decode_signatures().len(), 2);
        assert_eq!(
            lookup("crypto-punk-bought").unwrap().decode_signatures(),
            vec![crypto_punk_bought::EVENT_SIGNATURE.to_string()]
        );
    }

    #[test]
    fn test_usdc_filter() {
        let query = lookup("all-usdc-transfers").unwrap().build_query(1, 2);
        assert_eq!(query.logs.len(), 1);
        assert_eq!(query.logs[0].address, vec![all_usdc_transfers::USDC_CONTRACT_ADDRESS]);
        assert_eq!(query.logs[0].topics, vec![vec![TRANSFER_TOPIC.to_string()]]);
    }

    #[test]
    fn test_everything_includes_all_blocks() {
        let scenario = lookup("everything").unwrap();
        let query = scenario.build_query(1, 2);
        assert!(query.include_all_blocks);
        assert_eq!(query.requested_categories().len(), 4);
        assert_eq!(scenario.stream_config().hex_output, HexOutput::Prefixed);
    }
}
