//! Layered configuration: defaults, optional TOML file, environment

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{ClientConfig, DEFAULT_HYPERSYNC_URL};
use crate::error::Result;
use crate::height::DEFAULT_HEIGHT_URL;

pub const DEFAULT_CONFIG_FILE: &str = "bench";
pub const ENV_PREFIX: &str = "HYPERSYNC_BENCH";

#[derive(Debug, Clone, Deserialize)]
pub struct BenchConfig {
    pub hypersync: HypersyncConfig,
    pub benchmark: BenchmarkConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HypersyncConfig {
    pub url: String,
    pub height_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub max_blocks_per_request: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    pub window_size: u64,
    pub results_dir: PathBuf,
    /// Decode logs into `decoded_logs.parquet` during bulk runs
    pub save_data_as_parquet: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

impl BenchConfig {
    /// Load from `bench.toml` in the working directory if present, or from
    /// `path` (which must exist), then apply `HYPERSYNC_BENCH_*` variables.
    /// Sections are separated by a double underscore, e.g.
    /// `HYPERSYNC_BENCH_HYPERSYNC__API_TOKEN`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Self::defaults()?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("hypersync.url", DEFAULT_HYPERSYNC_URL)?
            .set_default("hypersync.height_url", DEFAULT_HEIGHT_URL)?
            .set_default("hypersync.request_timeout_secs", 120)?
            .set_default("benchmark.window_size", 100_000)?
            .set_default("benchmark.results_dir", "results")?
            .set_default("benchmark.save_data_as_parquet", true)?
            .set_default("log.level", "info")?)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.hypersync.url.clone(),
            api_token: self.api_token(),
            request_timeout: self.request_timeout(),
        }
    }

    /// Token with blank values treated as absent
    pub fn api_token(&self) -> Option<String> {
        self.hypersync
            .api_token
            .as_ref()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.hypersync.request_timeout_secs.max(1))
    }
}
