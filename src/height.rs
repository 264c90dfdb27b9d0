//! Chain height lookup and block window resolution

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{BenchError, Result};

pub const DEFAULT_HEIGHT_URL: &str = "https://eth.hypersync.xyz/height";

/// Trailing block range of one run: `[from_block, to_block)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub from_block: u64,
    pub to_block: u64,
}

impl BlockWindow {
    /// `[height - window_size, height)`. A chain shorter than the window
    /// cannot host it and is rejected rather than clamped.
    pub fn from_height(height: u64, window_size: u64) -> Result<Self> {
        let from_block = match height.checked_sub(window_size) {
            Some(from_block) if window_size > 0 => from_block,
            _ => return Err(BenchError::InvalidWindow { height, window_size }),
        };

        Ok(Self {
            from_block,
            to_block: height,
        })
    }

    pub fn len(&self) -> u64 {
        self.to_block - self.from_block
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait HeightSource: Send + Sync {
    async fn current_height(&self) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct HeightResponse {
    height: u64,
}

/// Reads `{ "height": n }` from the service's height endpoint
pub struct HttpHeightSource {
    http: Client,
    url: String,
    api_token: Option<String>,
}

impl HttpHeightSource {
    pub fn new(url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BenchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.to_string(),
            api_token,
        })
    }
}

#[async_trait]
impl HeightSource for HttpHeightSource {
    async fn current_height(&self) -> Result<u64> {
        debug!("Fetching chain height from {}", self.url);

        let mut request = self.http.get(&self.url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BenchError::HeightFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BenchError::HeightFetch(status.to_string()));
        }

        let body: HeightResponse = response
            .json()
            .await
            .map_err(|e| BenchError::HeightFetch(format!("invalid response body: {}", e)))?;

        Ok(body.height)
    }
}

/// Fetch the height once and derive the trailing window. No retry.
pub async fn resolve_window<H: HeightSource + ?Sized>(
    source: &H,
    window_size: u64,
) -> Result<BlockWindow> {
    let height = source.current_height().await?;
    let window = BlockWindow::from_height(height, window_size)?;
    info!(
        "Chain height {}, benchmarking blocks {}..{}",
        height, window.from_block, window.to_block
    );
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedHeight(u64);

    #[async_trait]
    impl HeightSource for FixedHeight {
        async fn current_height(&self) -> Result<u64> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_resolve_window_trails_height() {
        let window = resolve_window(&FixedHeight(21_000_000), 100_000).await.unwrap();
        assert_eq!(
            window,
            BlockWindow {
                from_block: 20_900_000,
                to_block: 21_000_000
            }
        );
        assert_eq!(window.len(), 100_000);
    }

    #[test]
    fn test_window_larger_than_chain_is_rejected() {
        assert!(matches!(
            BlockWindow::from_height(500, 100_000),
            Err(BenchError::InvalidWindow {
                height: 500,
                window_size: 100_000
            })
        ));

        let exact = BlockWindow::from_height(100_000, 100_000).unwrap();
        assert_eq!(exact.from_block, 0);
        assert_eq!(exact.len(), 100_000);
    }

    #[test]
    fn test_degenerate_windows_are_rejected() {
        assert!(matches!(
            BlockWindow::from_height(0, 100_000),
            Err(BenchError::InvalidWindow { .. })
        ));
        assert!(BlockWindow::from_height(1_000, 0).is_err());
    }

    #[tokio::test]
    async fn test_http_height_source() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/height")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"height": 21000000}"#)
            .create_async()
            .await;

        let source = HttpHeightSource::new(
            &format!("{}/height", server.url()),
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(source.current_height().await.unwrap(), 21_000_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_height_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/height")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let source =
            HttpHeightSource::new(&format!("{}/height", server.url()), None, Duration::from_secs(5))
                .unwrap();

        let err = resolve_window(&source, 100_000).await.unwrap_err();
        assert!(matches!(err, BenchError::HeightFetch(_)));
        assert!(err.to_string().contains("503"));
        mock.assert_async().await;
    }
}
