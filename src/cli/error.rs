//! CLI error types and conversions

use crate::archive::FetchError;
use crate::downloader::DownloadError;
use crate::metrics::MetricsError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Download error
    #[error("download error: {0}")]
    DownloadError(#[from] DownloadError),

    /// Fetch error outside a batch run
    #[error("fetch error: {0}")]
    FetchError(#[from] FetchError),

    /// Metrics exporter error
    #[error("metrics error: {0}")]
    MetricsError(#[from] MetricsError),

    /// Result could not be serialized
    #[error("output error: {0}")]
    OutputError(#[from] serde_json::Error),
}
