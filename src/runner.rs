//! Benchmark planning and execution

use clap::ValueEnum;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::client::StreamClient;
use crate::columnar::{count_all_rows, ParquetFooterReader, ParquetSink};
use crate::decoder::Decoder;
use crate::drain::{drain, Accumulator, CategoryCounts};
use crate::error::{BenchError, Result};
use crate::height::{resolve_window, HeightSource};
use crate::metrics::{
    Metrics, BENCHMARK_END, BENCHMARK_START, FETCH_DURATION, FETCH_END, FETCH_START, TOTAL_DURATION,
};
use crate::query::{Query, StreamConfig};
use crate::report::{results_dir, CountSource, ResultReport};
use crate::scenarios::{self, Scenario};
use crate::types::DataCategory;

/// Optional second positional argument of the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Modification {
    /// Decode logs against the scenario's event signatures while streaming
    Decoded,
    /// Keep everything in memory and write Parquet files after the stream ends
    SavedToParquet,
}

impl Modification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modification::Decoded => "decoded",
            Modification::SavedToParquet => "saved-to-parquet",
        }
    }
}

/// What the drain loop does with each batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    PlainCount,
    Decode,
    PersistToFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Drain the stream in-process
    Stream(Mode),
    /// Let the client write Parquet files, then count rows from their footers
    CollectParquet,
}

/// A validated run request. Building one performs no I/O, so bad input is
/// rejected before the height endpoint is contacted.
pub struct Plan {
    scenario: &'static Scenario,
    modification: Option<Modification>,
    strategy: Strategy,
    decoder: Option<Decoder>,
}

impl Plan {
    pub fn new(scenario: &str, modification: Option<Modification>, bulk: bool) -> Result<Self> {
        let scenario = scenarios::lookup(scenario)?;

        let unsupported = |modification: Modification, reason: &str| BenchError::UnsupportedModification {
            scenario: scenario.name.to_string(),
            modification: modification.as_str().to_string(),
            reason: reason.to_string(),
        };

        if bulk {
            if let Some(modification) = modification {
                return Err(unsupported(
                    modification,
                    "the bulk variant writes Parquet itself and takes no modification",
                ));
            }
        }

        let (strategy, decoder) = match (bulk, modification) {
            (true, _) => (Strategy::CollectParquet, None),
            (false, None) => (Strategy::Stream(Mode::PlainCount), None),
            (false, Some(Modification::SavedToParquet)) => (Strategy::Stream(Mode::PersistToFile), None),
            (false, Some(Modification::Decoded)) => {
                let signatures = scenario.decode_signatures();
                if signatures.is_empty() {
                    return Err(unsupported(
                        Modification::Decoded,
                        "no event signature is known for this scenario",
                    ));
                }
                (Strategy::Stream(Mode::Decode), Some(Decoder::from_signatures(&signatures)?))
            }
        };

        debug!("Planned {} as {:?}", scenario.name, strategy);

        Ok(Self {
            scenario,
            modification,
            strategy,
            decoder,
        })
    }

    pub fn scenario(&self) -> &'static Scenario {
        self.scenario
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Label shown next to the scenario name in reports
    pub fn variant(&self) -> Option<String> {
        match (self.strategy, self.modification) {
            (Strategy::CollectParquet, _) => Some("bulk".to_string()),
            (_, Some(modification)) => Some(modification.as_str().to_string()),
            (_, None) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub window_size: u64,
    pub results_dir: PathBuf,
    pub show_progress: bool,
    /// Overrides the scenario's request span when set
    pub max_blocks_per_request: Option<u64>,
    /// Bulk runs also write `decoded_logs` for scenarios with an event signature
    pub decode_in_bulk: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            window_size: 100_000,
            results_dir: PathBuf::from("results"),
            show_progress: true,
            max_blocks_per_request: None,
            decode_in_bulk: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: ResultReport,
    pub report_path: PathBuf,
    pub output_dir: PathBuf,
    pub parquet_files: Vec<PathBuf>,
}

pub struct BenchmarkRunner<C, H> {
    client: C,
    height: H,
    settings: RunSettings,
}

impl<C: StreamClient, H: HeightSource> BenchmarkRunner<C, H> {
    pub fn new(client: C, height: H, settings: RunSettings) -> Self {
        Self {
            client,
            height,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub async fn run(&self, plan: &Plan) -> Result<RunSummary> {
        let scenario = plan.scenario;
        let mut metrics = Metrics::new()?;
        metrics.mark(BENCHMARK_START);

        let window = resolve_window(&self.height, self.settings.window_size).await?;
        let query = scenario.build_query(window.from_block, window.to_block);
        let stream_config = self.stream_config(scenario);
        let output_dir = results_dir(&self.settings.results_dir, scenario.name, &window);

        info!(
            "Running {} over blocks {}..{} ({:?})",
            scenario.name, window.from_block, window.to_block, plan.strategy
        );

        let (counts, count_source, parquet_files) = match plan.strategy {
            Strategy::Stream(mode) => {
                self.stream(plan, mode, &query, &stream_config, &output_dir, &mut metrics)
                    .await?
            }
            Strategy::CollectParquet => {
                let categories = self.bulk_categories(scenario, &stream_config);
                metrics.mark(FETCH_START);
                self.client
                    .collect_parquet(&output_dir, &query, &stream_config)
                    .await?;
                metrics.mark(FETCH_END);

                let counts = count_all_rows(&ParquetFooterReader, &output_dir, &categories)?;
                let files = categories
                    .iter()
                    .map(|category| output_dir.join(category.file_name()))
                    .collect();
                (CategoryCounts::from(counts), CountSource::FileMetadata, files)
            }
        };

        metrics.measure(FETCH_DURATION, FETCH_START, FETCH_END)?;
        metrics.mark(BENCHMARK_END);
        metrics.measure(TOTAL_DURATION, BENCHMARK_START, BENCHMARK_END)?;

        let report = ResultReport::new(
            scenario.name,
            plan.variant(),
            window,
            counts,
            count_source,
            &metrics,
        )?;
        let report_path = report.write(&output_dir)?;

        Ok(RunSummary {
            report,
            report_path,
            output_dir,
            parquet_files,
        })
    }

    async fn stream(
        &self,
        plan: &Plan,
        mode: Mode,
        query: &Query,
        stream_config: &StreamConfig,
        output_dir: &Path,
        metrics: &mut Metrics,
    ) -> Result<(CategoryCounts, CountSource, Vec<PathBuf>)> {
        let mut categories = query.requested_categories();
        if plan.decoder.is_some() {
            categories.push(DataCategory::DecodedLogs);
        }

        let mut accumulator = match mode {
            Mode::PersistToFile => Some(Accumulator::new()),
            Mode::PlainCount | Mode::Decode => None,
        };
        let progress = self.progress_bar();

        metrics.mark(FETCH_START);
        let mut receiver = self.client.stream(query, stream_config).await?;
        let outcome = drain(
            receiver.as_mut(),
            &categories,
            plan.decoder.as_ref(),
            accumulator.as_mut(),
            metrics,
            &progress,
        )
        .await;
        progress.finish_and_clear();
        let outcome = outcome?;
        metrics.mark(FETCH_END);

        match accumulator {
            Some(accumulator) => {
                let files = persist(output_dir, query, &accumulator)?;
                let counts = count_all_rows(&ParquetFooterReader, output_dir, &categories)?;
                Ok((CategoryCounts::from(counts), CountSource::FileMetadata, files))
            }
            None => Ok((outcome.counts, CountSource::InMemory, Vec::new())),
        }
    }

    fn stream_config(&self, scenario: &Scenario) -> StreamConfig {
        let mut config = scenario.stream_config();
        if let Some(max_blocks) = self.settings.max_blocks_per_request {
            config.max_blocks_per_request = max_blocks;
        }
        if !self.settings.decode_in_bulk {
            config.event_signature = None;
        }
        config
    }

    fn bulk_categories(&self, scenario: &Scenario, config: &StreamConfig) -> Vec<DataCategory> {
        scenario
            .expected_categories(true)
            .into_iter()
            .filter(|category| *category != DataCategory::DecodedLogs || config.event_signature.is_some())
            .collect()
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        progress.enable_steady_tick(Duration::from_millis(120));
        progress.set_message("waiting for first batch");
        progress
    }
}

/// One row group per received batch
fn persist(dir: &Path, query: &Query, accumulator: &Accumulator) -> Result<Vec<PathBuf>> {
    let mut sink = ParquetSink::for_query(dir, query, None)?;
    for category in sink.categories() {
        for chunk in accumulator.chunks(category) {
            sink.write(category, chunk)?;
        }
    }
    sink.finish()
}

/// Console rendition of a finished run
pub fn print_summary(summary: &RunSummary) {
    let report = &summary.report;

    println!("{}", "═══════════════════════════════════════".bright_cyan());
    println!("{} {}", "Benchmarking scenario:".bright_green().bold(), report.title());
    println!("{}", "═══════════════════════════════════════".bright_cyan());
    println!(
        "  Block range: {}-{} ({} blocks)",
        report.window.from_block,
        report.window.to_block,
        report.window.len()
    );
    for (category, count) in report.counts.iter() {
        println!("  Total {} fetched: {}", category, count);
    }
    println!(
        "  Time taken for data fetching: {} milliseconds",
        format!("{:.2}", report.fetch_ms).bright_yellow()
    );
    println!("  Total benchmarking time: {:.2} milliseconds", report.total_ms);

    let stats = &report.batch_stats;
    if stats.batches > 0 {
        println!(
            "  Batches: {} (p50 {:.2}ms, p95 {:.2}ms, p99 {:.2}ms)",
            stats.batches, stats.p50_ms, stats.p95_ms, stats.p99_ms
        );
    }
    for file in &summary.parquet_files {
        println!("  Parquet: {}", file.display());
    }
    println!("  Report: {}", summary.report_path.display());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_plan() {
        let plan = Plan::new("all-logs", None, false).unwrap();
        assert_eq!(plan.strategy(), Strategy::Stream(Mode::PlainCount));
        assert_eq!(plan.variant(), None);
        assert!(plan.decoder.is_none());
    }

    #[test]
    fn test_decoded_needs_signatures() {
        let err = Plan::new("all-logs", Some(Modification::Decoded), false).err().unwrap();
        assert!(matches!(err, BenchError::UnsupportedModification { .. }));

        let plan = Plan::new("all-usdc-transfers", Some(Modification::Decoded), false).unwrap();
        assert_eq!(plan.strategy(), Strategy::Stream(Mode::Decode));
        assert!(plan.decoder.is_some());
    }

    #[test]
    fn test_combined_transfers_decode_both_shapes() {
        let plan = Plan::new("erc-20-and-721-transfers", Some(Modification::Decoded), false).unwrap();
        assert_eq!(plan.variant().as_deref(), Some("decoded"));
    }

    #[test]
    fn test_bulk_rejects_modifications() {
        let err = Plan::new("all-logs", Some(Modification::SavedToParquet), true).err().unwrap();
        assert!(err.to_string().contains("saved-to-parquet"));

        let plan = Plan::new("ALL-LOGS", None, true).unwrap();
        assert_eq!(plan.strategy(), Strategy::CollectParquet);
        assert_eq!(plan.variant().as_deref(), Some("bulk"));
    }

    #[test]
    fn test_unknown_scenario() {
        assert!(matches!(
            Plan::new("nope", None, false),
            Err(BenchError::UnknownScenario { .. })
        ));
    }
}
