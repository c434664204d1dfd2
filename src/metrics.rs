//! Download metrics for long archive runs
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Prometheus exporter for an optional scrape endpoint (`--metrics-addr`)
//! - Without an installed recorder every macro is a no-op, so the helpers can
//!   be called unconditionally from the engine and orchestrator

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Granularity;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus exporter could not be installed
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Initialize metrics system with Prometheus exporter
///
/// Call once at startup. Idempotent: later calls return `Ok(())` without
/// touching the installed exporter.
///
/// # Arguments
/// * `addr` - Socket address to bind the scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!(
        "archive_files_downloaded_total",
        Unit::Count,
        "Archive and checksum files saved to disk"
    );
    describe_counter!(
        "archive_bytes_downloaded_total",
        Unit::Bytes,
        "Bytes written to saved files"
    );
    describe_counter!(
        "archive_files_skipped_total",
        Unit::Count,
        "Files skipped because they already existed locally"
    );
    describe_counter!(
        "archive_files_not_found_total",
        Unit::Count,
        "Files the archive reported as missing (HTTP 404)"
    );
    describe_counter!(
        "archive_files_failed_total",
        Unit::Count,
        "Files that failed for reasons other than being missing"
    );
    describe_counter!(
        "archive_fetch_retries_total",
        Unit::Count,
        "Retry attempts after transient fetch failures"
    );
    describe_histogram!(
        "archive_fetch_duration_seconds",
        Unit::Seconds,
        "Time to fetch one file, retries included"
    );
    describe_histogram!(
        "archive_retry_backoff_seconds",
        Unit::Seconds,
        "Backoff waited before a retry"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Record a saved file
pub fn record_download(bytes: u64, duration: Duration) {
    counter!("archive_files_downloaded_total").increment(1);
    counter!("archive_bytes_downloaded_total").increment(bytes);
    histogram!("archive_fetch_duration_seconds").record(duration.as_secs_f64());
}

/// Record files skipped by one pair
pub fn record_skipped(granularity: Granularity, count: u64) {
    if count > 0 {
        counter!(
            "archive_files_skipped_total",
            "granularity" => granularity.to_string(),
        )
        .increment(count);
    }
}

/// Record a file missing from the archive
pub fn record_not_found(granularity: Granularity) {
    counter!(
        "archive_files_not_found_total",
        "granularity" => granularity.to_string(),
    )
    .increment(1);
}

/// Record a file that failed for any other reason
pub fn record_failure(granularity: Granularity) {
    counter!(
        "archive_files_failed_total",
        "granularity" => granularity.to_string(),
    )
    .increment(1);
}

/// Record retry backoff duration
pub fn record_retry_backoff(duration: Duration, attempt: u32) {
    counter!(
        "archive_fetch_retries_total",
        "attempt" => attempt.to_string(),
    )
    .increment(1);

    histogram!("archive_retry_backoff_seconds").record(duration.as_secs_f64());

    debug!(
        attempt = attempt,
        backoff_ms = duration.as_millis(),
        "Retry backoff recorded"
    );
}
