//! HTTP fetching.
//!
//! Wraps a configured reqwest client behind the two operations a mirroring
//! run needs: fetching a page as text and streaming an asset to a file.
//! Any non-2xx status is surfaced as an error, there are no retries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("page-mirror/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP fetcher with a shared client.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("page-mirror/0.1.0")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Create a fetcher with default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }

    /// Fetch a URL and return the response body as text.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        let response = check_status(response)?;

        Ok(response.text().await?)
    }

    /// Fetch a URL and write the response body to `target`.
    pub async fn fetch_to_file(&self, url: &Url, target: &Path) -> Result<(), FetchError> {
        debug!("Downloading {} to {:?}", url, target);

        let response = self.client.get(url.as_str()).send().await?;
        let response = check_status(response)?;
        let content = response.bytes().await?;

        let write_err = |source| FetchError::Io {
            path: target.to_path_buf(),
            source,
        };

        let mut file = fs::File::create(target).await.map_err(write_err)?;
        file.write_all(&content).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;

        Ok(())
    }
}

/// Reject any response outside the 2xx range.
fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    Ok(response)
}
