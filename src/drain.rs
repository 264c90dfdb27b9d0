//! Stream drain loop

use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

use crate::client::BatchReceiver;
use crate::decoder::Decoder;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::types::{Batch, DataCategory, Record};

/// Item counts per data category. Categories seeded up front are reported
/// even when nothing arrives for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts(BTreeMap<DataCategory, u64>);

impl CategoryCounts {
    pub fn with_categories(categories: &[DataCategory]) -> Self {
        Self(categories.iter().map(|category| (*category, 0)).collect())
    }

    pub fn add(&mut self, category: DataCategory, count: u64) {
        *self.0.entry(category).or_insert(0) += count;
    }

    pub fn get(&self, category: DataCategory) -> u64 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DataCategory, u64)> + '_ {
        self.0.iter().map(|(category, count)| (*category, *count))
    }
}

impl From<Vec<(DataCategory, u64)>> for CategoryCounts {
    fn from(counts: Vec<(DataCategory, u64)>) -> Self {
        let mut result = Self::default();
        for (category, count) in counts {
            result.add(category, count);
        }
        result
    }
}

impl fmt::Display for CategoryCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(category, count)| format!("{}={}", category, count))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Keeps every received batch in memory until the run ends.
///
/// Memory grows with the window: nothing is evicted or spilled. Windows too
/// large to hold should go through the bulk collect path instead.
#[derive(Debug, Default)]
pub struct Accumulator {
    batches: Vec<Batch>,
    decoded: Vec<Vec<Record>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, batch: Batch, decoded: Vec<Record>) {
        self.batches.push(batch);
        self.decoded.push(decoded);
    }

    /// Records of one category, one slice per received batch
    pub fn chunks(&self, category: DataCategory) -> Vec<&[Record]> {
        match category {
            DataCategory::DecodedLogs => self.decoded.iter().map(Vec::as_slice).collect(),
            _ => self.batches.iter().map(|batch| batch.records(category)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainOutcome {
    pub counts: CategoryCounts,
    pub batches: u64,
    /// Cursor of the last batch received
    pub last_block: Option<u64>,
}

/// Receive batches until the stream reports its end.
///
/// Counts are seeded with `categories`. With a decoder, each batch's logs are
/// decoded before the next receive and the first failure ends the drain.
pub async fn drain(
    receiver: &mut dyn BatchReceiver,
    categories: &[DataCategory],
    decoder: Option<&Decoder>,
    mut accumulator: Option<&mut Accumulator>,
    metrics: &mut Metrics,
    progress: &ProgressBar,
) -> Result<DrainOutcome> {
    let mut outcome = DrainOutcome {
        counts: CategoryCounts::with_categories(categories),
        batches: 0,
        last_block: None,
    };

    loop {
        let waiting = Instant::now();
        let Some(batch) = receiver.recv().await? else {
            break;
        };
        metrics.record_batch(waiting.elapsed());
        outcome.batches += 1;
        outcome.last_block = Some(batch.next_block);

        for category in DataCategory::STREAMED {
            let received = batch.records(category).len() as u64;
            if received > 0 {
                outcome.counts.add(category, received);
            }
        }

        let decoded = match decoder {
            Some(decoder) if !batch.logs.is_empty() => {
                let decoded = decoder.decode_logs(&batch.logs)?;
                outcome.counts.add(DataCategory::DecodedLogs, decoded.len() as u64);
                decoded.iter().map(|log| log.to_record()).collect()
            }
            _ => Vec::new(),
        };

        debug!(
            "Batch {}: {} items, next block {}",
            outcome.batches,
            batch.total_items(),
            batch.next_block
        );
        progress.set_message(format!(
            "{} batches, {} items, block {}",
            outcome.batches,
            outcome.counts.total(),
            batch.next_block
        ));
        progress.tick();

        if let Some(accumulator) = accumulator.as_deref_mut() {
            accumulator.push(batch, decoded);
        }
    }

    info!("Stream exhausted after {} batches: {}", outcome.batches, outcome.counts);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Result<Option<Batch>>>);

    #[async_trait]
    impl BatchReceiver for Scripted {
        async fn recv(&mut self) -> Result<Option<Batch>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn logs(count: usize, next_block: u64) -> Batch {
        Batch {
            logs: (0..count).map(|i| record(json!({"log_index": i}))).collect(),
            next_block,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_counts_sum_batch_lengths() {
        let mut receiver = Scripted(VecDeque::from(vec![
            Ok(Some(logs(2, 10))),
            Ok(Some(logs(1, 20))),
            Ok(None),
            Ok(Some(logs(100, 30))),
        ]));
        let mut metrics = Metrics::new().unwrap();

        let outcome = drain(
            &mut receiver,
            &[DataCategory::Logs, DataCategory::Transactions],
            None,
            None,
            &mut metrics,
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.counts.get(DataCategory::Logs), 3);
        assert_eq!(outcome.counts.get(DataCategory::Transactions), 0);
        assert_eq!(outcome.batches, 2);
        assert_eq!(outcome.last_block, Some(20));
        assert_eq!(metrics.batches(), 2);
        assert_eq!(receiver.0.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batches_do_not_end_the_stream() {
        let mut receiver = Scripted(VecDeque::from(vec![
            Ok(Some(Batch::default())),
            Ok(Some(logs(4, 5))),
            Ok(None),
        ]));
        let mut metrics = Metrics::new().unwrap();

        let outcome = drain(&mut receiver, &[], None, None, &mut metrics, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(outcome.counts.get(DataCategory::Logs), 4);
        assert_eq!(outcome.batches, 2);
    }

    #[tokio::test]
    async fn test_receive_error_propagates() {
        let mut receiver = Scripted(VecDeque::from(vec![
            Ok(Some(logs(1, 1))),
            Err(BenchError::StreamReceive("connection reset".to_string())),
        ]));
        let mut metrics = Metrics::new().unwrap();

        let err = drain(&mut receiver, &[], None, None, &mut metrics, &ProgressBar::hidden())
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::StreamReceive(_)));
    }

    #[tokio::test]
    async fn test_accumulator_keeps_batches_and_decoded_logs() {
        let transfer = record(json!({
            "topic0": "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
            "topic1": "0x000000000000000000000000a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "topic2": "0x000000000000000000000000dac17f958d2ee523a2206206994597c13d831ec7",
            "data": "0x0000000000000000000000000000000000000000000000000000000000000064"
        }));
        let mut receiver = Scripted(VecDeque::from(vec![
            Ok(Some(Batch {
                logs: vec![transfer.clone(), transfer],
                next_block: 7,
                ..Default::default()
            })),
            Ok(None),
        ]));
        let decoder = Decoder::from_signatures(&[
            "Transfer(address indexed from, address indexed to, uint256 value)",
        ])
        .unwrap();
        let mut accumulator = Accumulator::new();
        let mut metrics = Metrics::new().unwrap();

        let outcome = drain(
            &mut receiver,
            &[DataCategory::Logs, DataCategory::DecodedLogs],
            Some(&decoder),
            Some(&mut accumulator),
            &mut metrics,
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.counts.get(DataCategory::DecodedLogs), 2);
        assert_eq!(accumulator.len(), 1);
        assert_eq!(accumulator.chunks(DataCategory::Logs)[0].len(), 2);
        let decoded = accumulator.chunks(DataCategory::DecodedLogs);
        assert_eq!(decoded[0][0]["event"], json!("Transfer"));
    }

    #[test]
    fn test_counts_from_pairs() {
        let counts = CategoryCounts::from(vec![(DataCategory::Blocks, 4), (DataCategory::Logs, 1)]);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.to_string(), "logs=1, blocks=4");
    }
}
