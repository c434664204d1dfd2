//! Run accounting and progress events
//!
//! The orchestrator counts outcomes per (symbol, interval) pair in
//! [`RunStats`] and folds them into a [`RunSummary`] for its caller. While it
//! runs it emits [`ProgressEvent`]s to a [`ProgressReporter`]; formatting is
//! the reporter's business.

use serde::Serialize;
use std::ops::AddAssign;
use tracing::{info, warn};

use super::DownloadError;
use crate::{Granularity, Interval};

/// Outcome counters for one (symbol, interval) pair, or a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Files fetched successfully
    pub attempted: u64,
    /// Files already present locally
    pub skipped: u64,
    /// Files whose fetch failed for any reason
    pub failed: u64,
    /// Subset of `failed` the archive reported as missing (HTTP 404)
    pub not_found: u64,
}

impl RunStats {
    /// Failures other than missing files
    pub fn hard_failures(&self) -> u64 {
        self.failed.saturating_sub(self.not_found)
    }
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, rhs: Self) {
        self.attempted += rhs.attempted;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
        self.not_found += rhs.not_found;
    }
}

/// Counters for one finished (symbol, interval) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairReport {
    /// Archive partitioning
    pub granularity: Granularity,
    /// Symbol
    pub symbol: String,
    /// Interval
    pub interval: Interval,
    /// Counters
    pub stats: RunStats,
}

/// A file that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Archive or checksum file name
    pub file_name: String,
    /// Rendered error
    pub error: String,
    /// Whether the archive reported the file as missing
    pub not_found: bool,
}

/// Aggregate outcome of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Counters over every pair
    pub totals: RunStats,
    /// Per-pair counters, in completion order
    pub pairs: Vec<PairReport>,
    /// Every failed file
    pub failures: Vec<FileFailure>,
    /// Whether shutdown cut the run short
    pub interrupted: bool,
}

impl RunSummary {
    /// Fold a finished pair into the summary
    pub fn record_pair(&mut self, report: PairReport) {
        self.totals += report.stats;
        self.pairs.push(report);
    }

    /// Map the outcome to success or failure for the caller
    ///
    /// Missing archives are normal gaps and do not fail a run. Any other
    /// failure, or an interrupted run, does.
    pub fn ensure_success(&self) -> Result<(), DownloadError> {
        if self.interrupted {
            return Err(DownloadError::Interrupted);
        }
        let failed = self.totals.hard_failures();
        if failed > 0 {
            return Err(DownloadError::TasksFailed { failed });
        }
        Ok(())
    }
}

/// Structured progress notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Symbol list resolved from the exchange
    SymbolsResolved {
        /// Number of symbols listed
        count: usize,
    },
    /// A symbol is about to be processed for one granularity
    SymbolStarted {
        /// Archive partitioning
        granularity: Granularity,
        /// 1-based position in the symbol list
        index: usize,
        /// Length of the symbol list
        total: usize,
        /// Symbol
        symbol: String,
    },
    /// A file was saved
    FileDownloaded {
        /// File name
        file_name: String,
        /// Bytes written
        bytes: u64,
    },
    /// A file could not be fetched
    FileFailed(FileFailure),
    /// A pair skipped files already on disk (only sent when `skipped > 0`)
    PairSkipped {
        /// Symbol
        symbol: String,
        /// Interval
        interval: Interval,
        /// Files skipped
        skipped: u64,
    },
    /// A pair's periods are exhausted
    PairFinished(PairReport),
}

/// Receives progress events
pub trait ProgressReporter: Send + Sync {
    /// Handle one event
    fn report(&self, event: &ProgressEvent);
}

/// Reporter that writes events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::SymbolsResolved { count } => {
                info!(count = count, "Found {} symbols", count);
            }
            ProgressEvent::SymbolStarted {
                granularity,
                index,
                total,
                symbol,
            } => {
                info!(
                    granularity = %granularity,
                    symbol = %symbol,
                    "[{}/{}] - start {} download {} klines",
                    index, total, granularity, symbol
                );
            }
            ProgressEvent::FileDownloaded { file_name, bytes } => {
                info!(file = %file_name, bytes = bytes, "Downloaded");
            }
            ProgressEvent::FileFailed(failure) => {
                if failure.not_found {
                    info!(file = %failure.file_name, "File not found in archive");
                } else {
                    warn!(file = %failure.file_name, error = %failure.error, "Download failed");
                }
            }
            ProgressEvent::PairSkipped {
                symbol,
                interval,
                skipped,
            } => {
                info!(
                    symbol = %symbol,
                    interval = %interval,
                    skipped = skipped,
                    "Skipped {} existing files",
                    skipped
                );
            }
            ProgressEvent::PairFinished(report) => {
                info!(
                    granularity = %report.granularity,
                    symbol = %report.symbol,
                    interval = %report.interval,
                    attempted = report.stats.attempted,
                    skipped = report.stats.skipped,
                    failed = report.stats.failed,
                    "Pair finished"
                );
            }
        }
    }
}

/// Reporter that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _event: &ProgressEvent) {}
}
