use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{BenchError, Result};
use crate::query::{HexOutput, Query, StreamConfig};
use crate::types::{Batch, Record};

use super::{BatchReceiver, StreamClient};

pub const DEFAULT_HYPERSYNC_URL: &str = "https://eth.hypersync.xyz";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub api_token: Option<String>,
    /// Per-request timeout; the stream as a whole is never timed out
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_HYPERSYNC_URL.to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ResponseData {
    #[serde(default)]
    blocks: Vec<Record>,
    #[serde(default)]
    transactions: Vec<Record>,
    #[serde(default)]
    logs: Vec<Record>,
    #[serde(default)]
    traces: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Vec<ResponseData>,
    archive_height: Option<u64>,
    next_block: u64,
    total_execution_time: Option<u64>,
}

impl QueryResponse {
    fn into_batch(self, hex_output: HexOutput) -> Batch {
        let mut batch = Batch {
            next_block: self.next_block,
            ..Default::default()
        };

        for data in self.data {
            batch.blocks.extend(data.blocks);
            batch.transactions.extend(data.transactions);
            batch.logs.extend(data.logs);
            batch.traces.extend(data.traces);
        }

        if hex_output != HexOutput::NoEncode {
            for record in batch
                .logs
                .iter_mut()
                .chain(batch.transactions.iter_mut())
                .chain(batch.blocks.iter_mut())
                .chain(batch.traces.iter_mut())
            {
                render_hex(record, hex_output);
            }
        }

        batch
    }
}

fn render_hex(record: &mut Record, hex_output: HexOutput) {
    for value in record.values_mut() {
        hex_output.render_value(value);
    }
}

/// HTTP access to the HyperSync JSON query endpoint
#[derive(Clone)]
struct Fetcher {
    http: Client,
    url: String,
    api_token: Option<String>,
}

impl Fetcher {
    async fn query(&self, query: &Query) -> Result<QueryResponse> {
        let mut request = self.http.post(&self.url).json(query);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BenchError::StreamReceive(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BenchError::StreamReceive(format!("{} {}", status, body.trim())));
        }

        let page: QueryResponse = response
            .json()
            .await
            .map_err(|e| BenchError::StreamReceive(format!("invalid response body: {}", e)))?;

        debug!(
            "Blocks {}..{} answered up to {} (archive height {:?}, {:?} ms server time)",
            query.from_block, query.to_block, page.next_block, page.archive_height, page.total_execution_time
        );

        if page.next_block <= query.from_block {
            return Err(BenchError::StreamReceive(format!(
                "no progress: next block {} for request starting at {}",
                page.next_block, query.from_block
            )));
        }

        Ok(page)
    }
}

/// Receiving end of the page channel
struct ChannelReceiver {
    rx: mpsc::Receiver<Result<Batch>>,
}

#[async_trait]
impl BatchReceiver for ChannelReceiver {
    async fn recv(&mut self) -> Result<Option<Batch>> {
        match self.rx.recv().await {
            Some(Ok(batch)) => Ok(Some(batch)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Pages through the query range in a background task and hands batches
/// to the receiver over a bounded channel. No retries: the first failed
/// request ends the stream with its error.
pub struct HypersyncClient {
    fetcher: Fetcher,
}

impl HypersyncClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BenchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!("HyperSync client for {}", config.url);

        Ok(Self {
            fetcher: Fetcher {
                http,
                url: format!("{}/query", config.url.trim_end_matches('/')),
                api_token: config.api_token,
            },
        })
    }
}

#[async_trait]
impl StreamClient for HypersyncClient {
    async fn stream(&self, query: &Query, config: &StreamConfig) -> Result<Box<dyn BatchReceiver>> {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let fetcher = self.fetcher.clone();
        let query = query.clone();
        let config = config.clone();

        tokio::spawn(async move {
            let result = if config.reverse {
                stream_reverse(&fetcher, &query, &config, &tx).await
            } else {
                stream_forward(&fetcher, &query, &config, &tx).await
            };

            if let Err(e) = result {
                warn!("Stream aborted: {}", e);
                let _ = tx.send(Err(e)).await;
            }
        });

        Ok(Box::new(ChannelReceiver { rx }))
    }
}

async fn stream_forward(
    fetcher: &Fetcher,
    query: &Query,
    config: &StreamConfig,
    tx: &mpsc::Sender<Result<Batch>>,
) -> Result<()> {
    let step = config.max_blocks_per_request.max(1);
    let mut cursor = query.from_block;

    while cursor < query.to_block {
        let end = query.to_block.min(cursor.saturating_add(step));
        let page = fetcher.query(&query.with_range(cursor, end)).await?;
        cursor = page.next_block;

        let batch = page.into_batch(config.hex_output);
        if !batch.is_empty() && tx.send(Ok(batch)).await.is_err() {
            debug!("Receiver dropped, stopping at block {}", cursor);
            return Ok(());
        }
    }

    Ok(())
}

/// Walks the range top-down in chunks of `max_blocks_per_request`; each
/// chunk is fetched forward and delivered with its items reversed.
async fn stream_reverse(
    fetcher: &Fetcher,
    query: &Query,
    config: &StreamConfig,
    tx: &mpsc::Sender<Result<Batch>>,
) -> Result<()> {
    let step = config.max_blocks_per_request.max(1);
    let mut end = query.to_block;

    while end > query.from_block {
        let start = end.saturating_sub(step).max(query.from_block);
        let mut chunk = Batch::default();
        let mut cursor = start;

        while cursor < end {
            let page = fetcher.query(&query.with_range(cursor, end)).await?;
            cursor = page.next_block;
            chunk.extend(page.into_batch(config.hex_output));
        }

        chunk.reverse();
        chunk.next_block = start;
        if !chunk.is_empty() && tx.send(Ok(chunk)).await.is_err() {
            debug!("Receiver dropped, stopping at block {}", start);
            return Ok(());
        }
        end = start;
    }

    Ok(())
}
