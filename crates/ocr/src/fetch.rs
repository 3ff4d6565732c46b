use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Single-attempt fetch timeout used when nothing else is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Server responded with HTTP {0}")]
    Status(u16),
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of raw image bytes for a dataset row's `image_link`.
#[async_trait]
pub trait ImageFetcher {
    async fn fetch(&self, link: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http(s)://` links with one bounded request; anything else is read
/// as a local file path.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Request)?;
        Ok(Self { client, timeout })
    }

    /// Use a prebuilt client. `timeout` should match the one it was built with.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn map_err(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else {
            FetchError::Request(e)
        }
    }
}

fn is_remote(link: &str) -> bool {
    let lower = link.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, link: &str) -> Result<Vec<u8>, FetchError> {
        let link = link.trim();
        if !is_remote(link) {
            let path = link.strip_prefix("file://").unwrap_or(link);
            return Ok(tokio::fs::read(path).await?);
        }

        let resp = self.client.get(link).send().await.map_err(|e| self.map_err(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(|e| self.map_err(e))?;
        Ok(body.to_vec())
    }
}
