//! HyperSync Benchmark Harness
//!
//! Runs named query scenarios against a HyperSync endpoint over a trailing
//! window of blocks, drains the streamed response and reports how long it
//! took and how much came back.
//!
//! # Features
//!
//! - Scenario registry (logs, transactions, blocks, traces, token transfers)
//! - Optional log decoding from human-readable event signatures
//! - Parquet output with row counts read from file footers
//! - **Bulk collect** - the client writes Parquet files while streaming
//! - Per-batch latency percentiles
//!
//! # Example
//!
//! ```rust,no_run
//! use hypersync_bench::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HypersyncClient::new(ClientConfig::default())?;
//!     let height = HttpHeightSource::new(DEFAULT_HEIGHT_URL, None, Duration::from_secs(30))?;
//!
//!     let plan = Plan::new("all-usdc-transfers", Some(Modification::Decoded), false)?;
//!     let runner = BenchmarkRunner::new(client, height, RunSettings::default());
//!     let summary = runner.run(&plan).await?;
//!
//!     println!("{}", summary.report.render());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod columnar;
pub mod config;
pub mod decoder;
pub mod drain;
pub mod error;
pub mod height;
pub mod metrics;
pub mod query;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod types;

pub use client::{BatchReceiver, ClientConfig, HypersyncClient, StreamClient};
pub use decoder::{DecodedLog, Decoder};
pub use error::{BenchError, Result};
pub use height::{BlockWindow, HeightSource, HttpHeightSource};
pub use query::{Query, StreamConfig};
pub use runner::{BenchmarkRunner, Modification, Plan, RunSettings, RunSummary};
pub use types::{Batch, DataCategory, Record};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{
        BatchReceiver, ClientConfig, HypersyncClient, StreamClient, DEFAULT_HYPERSYNC_URL,
    };
    pub use crate::config::BenchConfig;
    pub use crate::decoder::{DecodedLog, Decoder};
    pub use crate::drain::{drain, Accumulator, CategoryCounts, DrainOutcome};
    pub use crate::error::{BenchError, Result};
    pub use crate::height::{
        resolve_window, BlockWindow, HeightSource, HttpHeightSource, DEFAULT_HEIGHT_URL,
    };
    pub use crate::metrics::Metrics;
    pub use crate::query::{FieldSelection, HexOutput, Query, StreamConfig};
    pub use crate::report::{CountSource, ResultReport};
    pub use crate::runner::{BenchmarkRunner, Modification, Plan, RunSettings, RunSummary, Strategy};
    pub use crate::scenarios::{self, Scenario};
    pub use crate::types::{Batch, DataCategory, Record};
}
