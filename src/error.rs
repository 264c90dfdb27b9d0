//! Error types for the benchmark harness

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for the harness
#[derive(Debug, Error)]
pub enum BenchError {
    /// Scenario name not present in the registry
    #[error("Unknown scenario: {name}. Available scenarios: {}", .available.join(", "))]
    UnknownScenario {
        name: String,
        available: Vec<&'static str>,
    },

    /// Modification cannot be applied to the selected scenario or variant
    #[error("Modification '{modification}' is not supported by scenario '{scenario}': {reason}")]
    UnsupportedModification {
        scenario: String,
        modification: String,
        reason: String,
    },

    /// Chain height endpoint failed or returned garbage
    #[error("Failed to fetch current height: {0}")]
    HeightFetch(String),

    /// Resolved height cannot host the configured window
    #[error("Invalid block window: height {height} with window size {window_size}")]
    InvalidWindow { height: u64, window_size: u64 },

    /// Transport fault while streaming from the remote service
    #[error("Stream receive error: {0}")]
    StreamReceive(String),

    /// Log did not match the decoder's expected signatures
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Timing marks used out of order
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl From<config::ConfigError> for BenchError {
    fn from(err: config::ConfigError) -> Self {
        BenchError::Config(err.to_string())
    }
}
