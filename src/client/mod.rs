//! Streaming client seam
//!
//! The harness only needs two things from the data service: a receiver that
//! yields batches until the stream ends, and a way to have the whole result
//! written to Parquet. `HypersyncClient` talks to the real service; tests
//! plug in their own implementations.

mod hypersync;

pub use hypersync::{ClientConfig, HypersyncClient, DEFAULT_HYPERSYNC_URL};

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::columnar::ParquetSink;
use crate::decoder::Decoder;
use crate::error::Result;
use crate::query::{Query, StreamConfig};
use crate::types::{Batch, DataCategory};

#[async_trait]
pub trait BatchReceiver: Send {
    /// Next batch, or `None` once the stream is exhausted
    async fn recv(&mut self) -> Result<Option<Batch>>;
}

#[async_trait]
pub trait StreamClient: Send + Sync {
    async fn stream(&self, query: &Query, config: &StreamConfig) -> Result<Box<dyn BatchReceiver>>;

    /// Stream the query into one Parquet file per category under `dir`.
    ///
    /// With `config.event_signature` set, logs are also decoded into
    /// `decoded_logs.parquet`. Returns once every file is closed.
    async fn collect_parquet(&self, dir: &Path, query: &Query, config: &StreamConfig) -> Result<()> {
        let decoder = match &config.event_signature {
            Some(signature) => Some(Decoder::from_signatures(&[signature.as_str()])?),
            None => None,
        };

        let mut sink = ParquetSink::for_query(dir, query, decoder.as_ref())?;
        let rows = match drain_into(self, &mut sink, query, config, decoder.as_ref()).await {
            Ok(rows) => rows,
            Err(e) => {
                sink.discard()?;
                return Err(e);
            }
        };

        sink.finish()?;
        info!("Collected {} rows into {}", rows, dir.display());
        Ok(())
    }
}

async fn drain_into<C: StreamClient + ?Sized>(
    client: &C,
    sink: &mut ParquetSink,
    query: &Query,
    config: &StreamConfig,
    decoder: Option<&Decoder>,
) -> Result<usize> {
    let mut receiver = client.stream(query, config).await?;
    let mut rows = 0usize;

    while let Some(batch) = receiver.recv().await? {
        for category in DataCategory::STREAMED {
            rows += sink.write(category, batch.records(category))?;
        }

        if let Some(decoder) = decoder {
            if !batch.logs.is_empty() {
                let decoded: Vec<_> = decoder
                    .decode_logs(&batch.logs)?
                    .iter()
                    .map(|log| log.to_record())
                    .collect();
                rows += sink.write(DataCategory::DecodedLogs, &decoded)?;
            }
        }
    }

    Ok(rows)
}
