//! Download engine: one remote file to local disk
//!
//! Each fetch streams the response body into a hidden temporary file in the
//! target directory, syncs it and renames it into place. A reader, or a
//! crash mid-transfer, never observes a partial file under the final name.
//!
//! Retry behaviour comes from [`RetryPolicy`]: transport failures are retried
//! with exponential backoff, explicit HTTP statuses fail on the first attempt
//! and never sleep.

use futures_util::StreamExt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::config::{RetryPolicy, Sleeper, TokioSleeper};
use super::task::DownloadTask;
use crate::archive::path::{archive_url, BASE_URL};
use crate::archive::{ArchiveTransport, FetchError, FetchResult};
use crate::metrics;
use crate::shutdown::SharedShutdown;

/// Outcome of a successful fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// File was transferred and placed at its final path
    Downloaded {
        /// Bytes written
        bytes: u64,
        /// Attempts used, including the successful one
        attempts: u32,
    },
    /// Final file already existed, nothing was transferred
    AlreadyPresent,
}

/// Result of fetching a task's archive and, when wanted, its checksum
#[derive(Debug)]
pub struct FetchReport {
    /// Archive fetch result
    pub archive: FetchResult<FetchOutcome>,
    /// Checksum fetch result, `None` when not attempted
    pub checksum: Option<FetchResult<FetchOutcome>>,
}

/// Fetches archive files with bounded retries
pub struct DownloadEngine {
    transport: Arc<dyn ArchiveTransport>,
    base_url: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    shutdown: Option<SharedShutdown>,
}

impl DownloadEngine {
    /// Engine against the public archive with the default retry policy
    pub fn new(transport: Arc<dyn ArchiveTransport>) -> Self {
        Self {
            transport,
            base_url: BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            shutdown: None,
        }
    }

    /// Override the archive root (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace how backoff delays are waited out
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Stop retrying once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Retry policy in effect
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch `file_name` from `remote_path` into `save_dir`
    ///
    /// Returns [`FetchOutcome::AlreadyPresent`] without any network traffic if
    /// the final file already exists.
    pub async fn fetch(
        &self,
        remote_path: &str,
        file_name: &str,
        save_dir: &Path,
    ) -> FetchResult<FetchOutcome> {
        if save_dir.join(file_name).exists() {
            debug!(file = %file_name, "File already exists, skipping download");
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let url = archive_url(&self.base_url, remote_path, file_name);
        let max_attempts = self.retry.max_attempts();
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(&url, file_name, save_dir).await {
                Ok(bytes) => {
                    metrics::record_download(bytes, started.elapsed());
                    if attempt > 1 {
                        debug!("Request succeeded on attempt {}", attempt);
                    }
                    info!(file = %file_name, bytes = bytes, "File downloaded");
                    return Ok(FetchOutcome::Downloaded {
                        bytes,
                        attempts: attempt,
                    });
                }
                Err(err) if self.retry.should_retry(&err, attempt) => {
                    warn!(
                        "Network error on attempt {}/{} for {}: {}",
                        attempt, max_attempts, file_name, err
                    );

                    let backoff = self.retry.backoff(attempt - 1);
                    metrics::record_retry_backoff(backoff, attempt);
                    debug!("Retrying after {:?}", backoff);

                    if !self.wait(backoff).await {
                        info!(file = %file_name, "Shutdown requested, abandoning retries");
                        return Err(err);
                    }
                }
                Err(err) if err.is_retryable() => {
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    debug!(file = %file_name, error = %err, "Non-retryable fetch failure");
                    return Err(err);
                }
            }
        }
    }

    /// Fetch a task's archive, then its checksum sidecar when wanted
    ///
    /// The sidecar is requested whatever happened to the archive, so a
    /// transient archive failure still leaves the sidecar on disk for the next
    /// run. A failed sidecar leaves the saved archive in place.
    pub async fn fetch_task(&self, task: &DownloadTask, save_dir: &Path) -> FetchReport {
        let archive = self
            .fetch(task.remote_path(), task.file_name(), save_dir)
            .await;

        let checksum = if task.want_checksum() {
            let name = task.checksum_file_name();
            Some(self.fetch(task.remote_path(), &name, save_dir).await)
        } else {
            None
        };

        FetchReport { archive, checksum }
    }

    /// Sleep for `backoff`, returning false if shutdown interrupted the wait
    async fn wait(&self, backoff: std::time::Duration) -> bool {
        match &self.shutdown {
            Some(shutdown) => {
                if shutdown.is_shutdown_requested() {
                    return false;
                }
                tokio::select! {
                    _ = self.sleeper.sleep(backoff) => true,
                    _ = shutdown.wait_for_shutdown() => false,
                }
            }
            None => {
                self.sleeper.sleep(backoff).await;
                true
            }
        }
    }

    async fn fetch_once(&self, url: &str, file_name: &str, save_dir: &Path) -> FetchResult<u64> {
        let mut body = self.transport.get(url).await?;

        std::fs::create_dir_all(save_dir).map_err(|e| {
            FetchError::io(format!("Failed to create {}", save_dir.display()), e)
        })?;

        let mut temp_file = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".part")
            .tempfile_in(save_dir)
            .map_err(|e| FetchError::io("Failed to create temp file", e))?;

        let mut bytes = 0u64;
        while let Some(chunk) = body.next().await {
            // Dropping the temp file on error removes it
            let chunk = chunk?;
            temp_file
                .write_all(&chunk)
                .map_err(|e| FetchError::io("Failed to write temp file", e))?;
            bytes += chunk.len() as u64;
        }

        // Flush buffer to OS and sync to disk before the rename
        temp_file
            .flush()
            .map_err(|e| FetchError::io("Failed to flush temp file", e))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| FetchError::io("Failed to sync temp file", e))?;

        let target = save_dir.join(file_name);
        temp_file
            .persist(&target)
            .map_err(|e| FetchError::io("Failed to persist temp file", e.error))?;

        // Fsync the directory so the rename itself is durable
        if let Ok(dir) = std::fs::File::open(save_dir) {
            let _ = dir.sync_all();
        }

        Ok(bytes)
    }
}
