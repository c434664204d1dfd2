//! Download orchestration
//!
//! This module decides which archive files a run needs and fetches exactly
//! those.
//!
//! # Overview
//!
//! 1. **Enumeration**: [`period`] turns years, months and dates into periods
//!    inside an [`EffectiveDateBound`]
//! 2. **Resume**: [`scanner`] lists each save directory once so files already
//!    on disk are skipped
//! 3. **Fetching**: [`DownloadEngine`] downloads one file with retries and an
//!    atomic rename
//! 4. **Orchestration**: [`BatchOrchestrator`] walks symbols, intervals and
//!    periods and accumulates a [`RunSummary`]
//!
//! # Quick Start
//!
//! ```no_run
//! use kline_archive_downloader::archive::http::ReqwestTransport;
//! use kline_archive_downloader::archive::symbols::StaticSymbols;
//! use kline_archive_downloader::downloader::{BatchOrchestrator, DownloadEngine, RunConfig};
//! use kline_archive_downloader::TradingType;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = RunConfig::new(TradingType::CoinMargined);
//! config.symbols = vec!["BTCUSD_PERP".to_string()];
//! config.skip_monthly = true;
//!
//! let engine = DownloadEngine::new(Arc::new(ReqwestTransport::with_default_timeout()?));
//! let summary = BatchOrchestrator::new(engine, StaticSymbols(Vec::new()))
//!     .run(&config, chrono::Utc::now().date_naive())
//!     .await?;
//! summary.ensure_success()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Per-file failures never abort a run; they are counted in [`RunStats`] and
//! listed in [`RunSummary::failures`]. [`RunSummary::ensure_success`] turns
//! the summary into a [`DownloadError`] for callers that want one.

pub mod config;
pub mod engine;
pub mod orchestrator;
pub mod period;
pub mod progress;
pub mod scanner;
pub mod task;

pub use config::{RetryPolicy, RunConfig, Sleeper, TokioSleeper};
pub use engine::{DownloadEngine, FetchOutcome, FetchReport};
pub use orchestrator::BatchOrchestrator;
pub use period::{EffectiveDateBound, Period, YearMonth};
pub use progress::{
    FileFailure, NullReporter, PairReport, ProgressEvent, ProgressReporter, RunStats, RunSummary,
    TracingReporter,
};
pub use scanner::{DirectoryScanner, ExistingFileSet, FileScanner};
pub use task::DownloadTask;

use crate::archive::FetchError;

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Symbol list could not be retrieved
    #[error("failed to list symbols: {0}")]
    SymbolListing(FetchError),

    /// Some files failed for reasons other than being missing
    #[error("{failed} file(s) failed to download")]
    TasksFailed {
        /// Number of hard failures
        failed: u64,
    },

    /// Shutdown stopped the run before every file was processed
    #[error("download interrupted before completion")]
    Interrupted,
}
