//! Timing marks, named measures and batch latency statistics

use hdrhistogram::Histogram;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::{BenchError, Result};

pub const BENCHMARK_START: &str = "benchmark-start";
pub const BENCHMARK_END: &str = "benchmark-end";
pub const FETCH_START: &str = "fetch-start";
pub const FETCH_END: &str = "fetch-end";

/// Largest batch latency kept apart in the histogram: one hour in
/// microseconds. Longer waits are recorded as this value.
pub const MAX_TRACKED_LATENCY_MICROS: u64 = 3_600_000_000;

pub const FETCH_DURATION: &str = "Benchmark Duration";
pub const TOTAL_DURATION: &str = "Total Benchmark Time";

#[derive(Debug, Clone)]
pub struct Measure {
    pub name: String,
    pub duration: Duration,
}

impl Measure {
    pub fn millis(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

/// Per-run metrics. Nothing outlives the run.
#[derive(Debug)]
pub struct Metrics {
    marks: HashMap<String, Instant>,
    measures: Vec<Measure>,
    batches: u64,
    /// Receive latency per batch, in microseconds
    batch_latency: Histogram<u64>,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let batch_latency = Histogram::<u64>::new_with_bounds(1, MAX_TRACKED_LATENCY_MICROS, 3)
            .map_err(|e| BenchError::Metrics(format!("Failed to create histogram: {}", e)))?;

        Ok(Self {
            marks: HashMap::new(),
            measures: Vec::new(),
            batches: 0,
            batch_latency,
        })
    }

    pub fn mark(&mut self, name: &str) {
        self.mark_at(name, Instant::now());
    }

    pub fn mark_at(&mut self, name: &str, at: Instant) {
        self.marks.insert(name.to_string(), at);
    }

    /// Record the time between two marks under `name`. Re-measuring a name
    /// replaces the earlier value.
    pub fn measure(&mut self, name: &str, start_mark: &str, end_mark: &str) -> Result<Duration> {
        let start = self.instant(start_mark)?;
        let end = self.instant(end_mark)?;
        let duration = end.checked_duration_since(start).ok_or_else(|| {
            BenchError::Metrics(format!("Mark '{}' precedes mark '{}'", end_mark, start_mark))
        })?;

        self.measures.retain(|m| m.name != name);
        self.measures.push(Measure {
            name: name.to_string(),
            duration,
        });
        Ok(duration)
    }

    fn instant(&self, mark: &str) -> Result<Instant> {
        self.marks
            .get(mark)
            .copied()
            .ok_or_else(|| BenchError::Metrics(format!("Unknown mark '{}'", mark)))
    }

    pub fn get(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name == name)
    }

    pub fn duration_ms(&self, name: &str) -> Option<f64> {
        self.get(name).map(Measure::millis)
    }

    /// All measures in the order they were taken
    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn record_batch(&mut self, latency: Duration) {
        self.batches += 1;
        let micros = latency.as_micros().min(u64::MAX as u128) as u64;
        self.batch_latency.saturating_record(micros.max(1));
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn batch_latency_ms(&self, percentile: f64) -> f64 {
        if self.batches == 0 {
            return 0.0;
        }
        self.batch_latency.value_at_percentile(percentile) as f64 / 1000.0
    }

    pub fn max_batch_latency_ms(&self) -> f64 {
        if self.batches == 0 {
            return 0.0;
        }
        self.batch_latency.max() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_between_marks() {
        let mut metrics = Metrics::new().unwrap();
        let start = Instant::now();
        metrics.mark_at(FETCH_START, start);
        metrics.mark_at(FETCH_END, start + Duration::from_millis(250));

        let duration = metrics.measure(FETCH_DURATION, FETCH_START, FETCH_END).unwrap();
        assert_eq!(duration, Duration::from_millis(250));
        assert_eq!(metrics.duration_ms(FETCH_DURATION), Some(250.0));
        assert_eq!(metrics.measures().len(), 1);
    }

    #[test]
    fn test_remeasure_replaces() {
        let mut metrics = Metrics::new().unwrap();
        let start = Instant::now();
        metrics.mark_at("a", start);
        metrics.mark_at("b", start + Duration::from_millis(10));
        metrics.measure("m", "a", "b").unwrap();
        metrics.mark_at("b", start + Duration::from_millis(20));
        metrics.measure("m", "a", "b").unwrap();

        assert_eq!(metrics.measures().len(), 1);
        assert_eq!(metrics.get("m").unwrap().duration, Duration::from_millis(20));
    }

    #[test]
    fn test_missing_or_reversed_marks() {
        let mut metrics = Metrics::new().unwrap();
        assert!(matches!(
            metrics.measure("m", "nope", "nada"),
            Err(BenchError::Metrics(_))
        ));

        let start = Instant::now();
        metrics.mark_at("late", start + Duration::from_millis(5));
        metrics.mark_at("early", start);
        assert!(metrics.measure("m", "late", "early").is_err());
        assert!(metrics.get("m").is_none());
    }

    #[test]
    fn test_oversized_latency_is_clamped() {
        let mut metrics = Metrics::new().unwrap();
        metrics.record_batch(Duration::from_secs(10 * 3600));

        assert_eq!(metrics.batches(), 1);
        let max = metrics.max_batch_latency_ms();
        assert!(max >= 3_599_000.0 && max <= 3_610_000.0, "max was {}", max);
    }

    #[test]
    fn test_batch_latency() {
        let mut metrics = Metrics::new().unwrap();
        assert_eq!(metrics.batch_latency_ms(50.0), 0.0);

        for ms in [10, 20, 30, 40] {
            metrics.record_batch(Duration::from_millis(ms));
        }

        assert_eq!(metrics.batches(), 4);
        let p50 = metrics.batch_latency_ms(50.0);
        assert!((19.0..=21.0).contains(&p50), "p50 was {p50}");
        assert!(metrics.max_batch_latency_ms() >= 39.9);
    }
}
