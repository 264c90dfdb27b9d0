//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

use crate::runner::Modification;

#[derive(Parser, Debug)]
#[command(name = "benchmark")]
#[command(about = "HyperSync streaming benchmark harness", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Scenario to run, e.g. all-logs or all-usdc-transfers
    pub scenario: String,

    /// Optional modification of the run
    #[arg(value_enum)]
    pub modification: Option<Modification>,

    /// Let the client write Parquet files and count rows from their metadata
    #[arg(long)]
    pub bulk: bool,

    /// Number of trailing blocks to benchmark
    #[arg(short = 'w', long)]
    pub window: Option<u64>,

    /// Root directory for reports and Parquet output
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Configuration file (defaults to ./bench.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// HyperSync endpoint URL
    #[arg(long)]
    pub url: Option<String>,

    /// Chain height endpoint URL
    #[arg(long)]
    pub height_url: Option<String>,

    /// Hide the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_and_modification() {
        let cli = Cli::try_parse_from(["benchmark", "all-usdc-transfers", "decoded"]).unwrap();
        assert_eq!(cli.scenario, "all-usdc-transfers");
        assert_eq!(cli.modification, Some(Modification::Decoded));
        assert!(!cli.bulk);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "benchmark",
            "everything",
            "--bulk",
            "--window",
            "500",
            "--results-dir",
            "/tmp/out",
            "--no-progress",
        ])
        .unwrap();
        assert!(cli.bulk);
        assert_eq!(cli.window, Some(500));
        assert_eq!(cli.results_dir, Some(PathBuf::from("/tmp/out")));
        assert!(cli.no_progress);
        assert_eq!(cli.modification, None);
    }

    #[test]
    fn test_saved_to_parquet_spelling() {
        let cli = Cli::try_parse_from(["benchmark", "all-logs", "saved-to-parquet"]).unwrap();
        assert_eq!(cli.modification, Some(Modification::SavedToParquet));
        assert!(Cli::try_parse_from(["benchmark", "all-logs", "compressed"]).is_err());
    }

    #[test]
    fn test_scenario_is_required() {
        assert!(Cli::try_parse_from(["benchmark"]).is_err());
    }
}
