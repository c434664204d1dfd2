//! reqwest-backed archive transport
//!
//! One [`reqwest::Client`] is shared by the download engine and the symbol
//! lister so connections to the archive host are pooled. The client carries
//! both a connect timeout and an overall request timeout, which also bounds
//! reading the response body: a stalled transfer fails as a retryable
//! [`FetchError::Timeout`] instead of hanging the batch.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{ArchiveTransport, ByteStream, FetchError, FetchResult};

/// HTTP connect timeout (seconds)
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default overall request timeout (seconds), body included
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Archive transport over HTTP
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    request_timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport with the given overall request timeout
    ///
    /// # Errors
    /// Returns [`FetchError::ClientConfig`] if the timeout is zero or the TLS
    /// backend cannot be initialised.
    pub fn new(request_timeout: Duration) -> FetchResult<Self> {
        if request_timeout.is_zero() {
            return Err(FetchError::ClientConfig(
                "request timeout must be non-zero".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(request_timeout)
            .build()
            .map_err(|e| FetchError::ClientConfig(e.to_string()))?;

        Ok(Self {
            client,
            request_timeout,
        })
    }

    /// Build a transport with [`DEFAULT_REQUEST_TIMEOUT_SECS`]
    pub fn with_default_timeout() -> FetchResult<Self> {
        Self::new(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Configured overall request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    async fn send(&self, url: &str) -> FetchResult<reqwest::Response> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// GET `url` and return the body as text
    pub async fn get_text(&self, url: &str) -> FetchResult<String> {
        let response = self.send(url).await?;
        response.text().await.map_err(FetchError::from_reqwest)
    }
}

#[async_trait]
impl ArchiveTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> FetchResult<ByteStream> {
        let response = self.send(url).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(FetchError::from_reqwest));
        Ok(Box::pin(body))
    }
}
