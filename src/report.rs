//! Result report rendering and persistence

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::drain::CategoryCounts;
use crate::error::{BenchError, Result};
use crate::height::BlockWindow;
use crate::metrics::{Metrics, FETCH_DURATION, TOTAL_DURATION};

pub const REPORT_FILE: &str = "results.txt";

/// Where the reported counts came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    /// Running totals kept while draining the stream
    InMemory,
    /// Row-group metadata of the written Parquet files
    FileMetadata,
}

impl CountSource {
    fn describe(&self) -> &'static str {
        match self {
            CountSource::InMemory => "stream",
            CountSource::FileMetadata => "parquet metadata",
        }
    }
}

/// `<root>/<scenario>/<from>-<to>`
pub fn results_dir(root: &Path, scenario: &str, window: &BlockWindow) -> PathBuf {
    root.join(scenario)
        .join(format!("{}-{}", window.from_block, window.to_block))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub batches: u64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

impl BatchStats {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        Self {
            batches: metrics.batches(),
            p50_ms: metrics.batch_latency_ms(50.0),
            p95_ms: metrics.batch_latency_ms(95.0),
            p99_ms: metrics.batch_latency_ms(99.0),
            max_ms: metrics.max_batch_latency_ms(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultReport {
    pub scenario: String,
    /// Modification or variant label, e.g. `decoded` or `bulk`
    pub variant: Option<String>,
    pub window: BlockWindow,
    pub counts: CategoryCounts,
    pub count_source: CountSource,
    pub fetch_ms: f64,
    pub total_ms: f64,
    pub batch_stats: BatchStats,
    pub generated_at: DateTime<Utc>,
}

impl ResultReport {
    /// Takes both durations from `metrics`; a missing measure is an error.
    pub fn new(
        scenario: &str,
        variant: Option<String>,
        window: BlockWindow,
        counts: CategoryCounts,
        count_source: CountSource,
        metrics: &Metrics,
    ) -> Result<Self> {
        let measured = |name: &str| {
            metrics
                .duration_ms(name)
                .ok_or_else(|| BenchError::Metrics(format!("Measure '{}' was never taken", name)))
        };

        Ok(Self {
            scenario: scenario.to_string(),
            variant,
            window,
            counts,
            count_source,
            fetch_ms: measured(FETCH_DURATION)?,
            total_ms: measured(TOTAL_DURATION)?,
            batch_stats: BatchStats::from_metrics(metrics),
            generated_at: Utc::now(),
        })
    }

    pub fn title(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{} ({})", self.scenario, variant),
            None => self.scenario.clone(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Benchmarking scenario: {}", self.title());
        let _ = writeln!(
            out,
            "Block range: {}-{} ({} blocks)",
            self.window.from_block,
            self.window.to_block,
            self.window.len()
        );
        let _ = writeln!(out, "Counts from: {}", self.count_source.describe());
        for (category, count) in self.counts.iter() {
            let _ = writeln!(out, "Total {} fetched: {}", category, count);
        }
        let _ = writeln!(out, "Time taken for data fetching: {:.2} milliseconds", self.fetch_ms);
        let _ = writeln!(out, "Total benchmarking time: {:.2} milliseconds", self.total_ms);

        let stats = &self.batch_stats;
        if stats.batches > 0 {
            let _ = writeln!(out, "Batches received: {}", stats.batches);
            let _ = writeln!(
                out,
                "Batch latency p50/p95/p99/max: {:.2}/{:.2}/{:.2}/{:.2} milliseconds",
                stats.p50_ms, stats.p95_ms, stats.p99_ms, stats.max_ms
            );
        }

        let _ = writeln!(
            out,
            "Generated at: {}",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        out
    }

    /// Write `results.txt` into `dir`, replacing any earlier report
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        fs::write(&path, self.render())?;
        info!("Report written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{BENCHMARK_END, BENCHMARK_START, FETCH_END, FETCH_START};
    use crate::types::DataCategory;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn window() -> BlockWindow {
        BlockWindow {
            from_block: 20_900_000,
            to_block: 21_000_000,
        }
    }

    fn measured_metrics() -> Metrics {
        let mut metrics = Metrics::new().unwrap();
        let start = Instant::now();
        metrics.mark_at(BENCHMARK_START, start);
        metrics.mark_at(FETCH_START, start + Duration::from_millis(5));
        metrics.mark_at(FETCH_END, start + Duration::from_millis(1_255));
        metrics.mark_at(BENCHMARK_END, start + Duration::from_millis(1_260));
        metrics.measure(FETCH_DURATION, FETCH_START, FETCH_END).unwrap();
        metrics.measure(TOTAL_DURATION, BENCHMARK_START, BENCHMARK_END).unwrap();
        metrics
    }

    fn report(metrics: &Metrics) -> ResultReport {
        let counts = CategoryCounts::from(vec![(DataCategory::Logs, 3), (DataCategory::DecodedLogs, 3)]);
        ResultReport::new(
            "all-usdc-transfers",
            Some("decoded".to_string()),
            window(),
            counts,
            CountSource::InMemory,
            metrics,
        )
        .unwrap()
    }

    #[test]
    fn test_results_dir_layout() {
        assert_eq!(
            results_dir(Path::new("results"), "all-logs", &window()),
            PathBuf::from("results/all-logs/20900000-21000000")
        );
    }

    #[test]
    fn test_render_lines() {
        let rendered = report(&measured_metrics()).render();

        assert!(rendered.starts_with("Benchmarking scenario: all-usdc-transfers (decoded)\n"));
        assert!(rendered.contains("Block range: 20900000-21000000 (100000 blocks)"));
        assert!(rendered.contains("Total logs fetched: 3\n"));
        assert!(rendered.contains("Total decoded_logs fetched: 3\n"));
        assert!(rendered.contains("Time taken for data fetching: 1250.00 milliseconds"));
        assert!(rendered.contains("Total benchmarking time: 1260.00 milliseconds"));
        assert!(!rendered.contains("Batches received"));
    }

    #[test]
    fn test_missing_measure_is_an_error() {
        let metrics = Metrics::new().unwrap();
        let err = ResultReport::new(
            "all-logs",
            None,
            window(),
            CategoryCounts::default(),
            CountSource::InMemory,
            &metrics,
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::Metrics(_)));
    }

    #[test]
    fn test_write_overwrites_previous_report() {
        let root = tempdir().unwrap();
        let dir = results_dir(root.path(), "all-logs", &window());
        let metrics = measured_metrics();

        let mut first = report(&metrics);
        first.scenario = "first".to_string();
        first.write(&dir).unwrap();
        let path = report(&metrics).write(&dir).unwrap();

        assert_eq!(path, dir.join(REPORT_FILE));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("all-usdc-transfers"));
        assert!(!content.contains("first"));
    }
}
