//! Remote archive access
//!
//! Everything that knows about the Binance Vision side of a download lives here:
//! how logical coordinates map to remote paths and URLs ([`path`]), the per-market
//! constants ([`market`]), the HTTP transport ([`http`]) and symbol discovery
//! ([`symbols`]).
//!
//! The [`ArchiveTransport`] trait is the seam the download engine fetches through,
//! so tests can substitute a scripted transport for the network.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;

pub mod http;
pub mod market;
pub mod path;
pub mod symbols;

/// Fetch errors
///
/// Only transport-level failures are retryable. An explicit HTTP status from the
/// archive is an answer, not a glitch, and is surfaced immediately.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS or interrupted-body failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// Request did not complete within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Archive answered with a non-success status code
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Status code returned by the server
        status: u16,
        /// URL that was requested
        url: String,
    },

    /// Local directory creation or write failure
    #[error("IO error: {0}")]
    IoError(String),

    /// Retryable failures persisted past the retry budget
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total attempts made
        attempts: u32,
        /// Error from the final attempt
        last: Box<FetchError>,
    },

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// HTTP client could not be constructed
    #[error("HTTP client configuration error: {0}")]
    ClientConfig(String),
}

impl FetchError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::NetworkError(_) | FetchError::Timeout(_))
    }

    /// Whether the archive reported the file as missing (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::HttpStatus { status: 404, .. })
    }

    /// Classify a reqwest error into the fetch taxonomy
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout(err.to_string());
        }
        if let Some(status) = err.status() {
            return FetchError::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if err.is_builder() {
            return FetchError::ClientConfig(err.to_string());
        }
        FetchError::NetworkError(err.to_string())
    }

    pub(crate) fn io(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        FetchError::IoError(format!("{context}: {err}"))
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Streamed response body
pub type ByteStream = Pin<Box<dyn Stream<Item = FetchResult<Bytes>> + Send>>;

/// Source of archive bytes
#[async_trait]
pub trait ArchiveTransport: Send + Sync {
    /// Issue a GET for `url` and return the body as a stream of chunks.
    ///
    /// Implementations must return [`FetchError::HttpStatus`] for any non-success
    /// status and a retryable variant for transport failures, including failures
    /// while the body is being read.
    async fn get(&self, url: &str) -> FetchResult<ByteStream>;
}
