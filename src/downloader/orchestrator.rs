//! Batch orchestration across symbols, intervals and periods
//!
//! Runs the monthly pass, then the daily pass. Within a pass symbols form
//! the outer loop and intervals the inner one, each (symbol, interval) pair
//! walking its periods in order:
//!
//! ```text
//! Scanning -> Iterating(periods) -> Reporting -> next pair
//! ```
//!
//! A pair lists its save directory exactly once before any fetch. Files found
//! there are skipped by name. A failed file is recorded and the walk moves on;
//! nothing short of shutdown stops the batch early.
//!
//! With `concurrency > 1` the pairs of one symbol run through a bounded
//! buffer. Each pair still owns its own scan and counters, and results are
//! folded in interval order.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::config::RunConfig;
use super::engine::{DownloadEngine, FetchOutcome};
use super::period::{daily_plan, monthly_periods, Period};
use super::progress::{
    FileFailure, PairReport, ProgressEvent, ProgressReporter, RunStats, RunSummary,
    TracingReporter,
};
use super::scanner::{DirectoryScanner, ExistingFileSet, FileScanner};
use super::task::DownloadTask;
use super::DownloadError;
use crate::archive::path::{archive_file_name, checksum_file_name, remote_path, save_dir};
use crate::archive::symbols::SymbolLister;
use crate::archive::FetchError;
use crate::metrics;
use crate::shutdown::SharedShutdown;
use crate::{DataKind, Granularity, Interval};

/// Drives a whole download run
pub struct BatchOrchestrator {
    engine: DownloadEngine,
    lister: Box<dyn SymbolLister>,
    scanner: Box<dyn FileScanner>,
    reporter: Arc<dyn ProgressReporter>,
    shutdown: Option<SharedShutdown>,
}

/// Inputs shared by every pair of one pass
struct Pass<'a> {
    config: &'a RunConfig,
    granularity: Granularity,
    periods: &'a [Period],
    label: Option<&'a str>,
}

struct PairOutcome {
    report: PairReport,
    failures: Vec<FileFailure>,
    interrupted: bool,
}

impl BatchOrchestrator {
    /// Orchestrator scanning the local filesystem and logging progress
    pub fn new(engine: DownloadEngine, lister: impl SymbolLister + 'static) -> Self {
        Self {
            engine,
            lister: Box::new(lister),
            scanner: Box::new(DirectoryScanner),
            reporter: Arc::new(TracingReporter),
            shutdown: None,
        }
    }

    /// Replace the existing-file scanner
    pub fn with_scanner(mut self, scanner: impl FileScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    /// Replace the progress reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Stop dispatching new files once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run both passes for `config`, with `today` as the current date
    ///
    /// # Errors
    /// Only symbol discovery failing aborts the run. Per-file failures are
    /// reported in the returned [`RunSummary`].
    pub async fn run(&self, config: &RunConfig, today: NaiveDate) -> Result<RunSummary, DownloadError> {
        let mut summary = RunSummary::default();
        if !config.runs_monthly() && !config.runs_daily() {
            info!("Both monthly and daily passes are skipped, nothing to do");
            return Ok(summary);
        }

        let symbols = self.resolve_symbols(config).await?;
        let bound = config.bound(today);
        let label = config.date_range_label();
        debug!(start = %bound.start, end = %bound.end, "Effective date bound");

        if config.runs_monthly() {
            let periods: Vec<Period> = monthly_periods(&config.years, &config.months, &bound)
                .into_iter()
                .map(Period::Month)
                .collect();
            let pass = Pass {
                config,
                granularity: Granularity::Monthly,
                periods: &periods,
                label: label.as_deref(),
            };
            self.run_pass(&pass, &symbols, &config.intervals, &mut summary)
                .await;
        }

        if config.runs_daily() && !summary.interrupted {
            let dates = config.daily_dates(today);
            let plan = daily_plan(&config.intervals, &dates, &bound);
            let periods: Vec<Period> = plan.dates.into_iter().map(Period::Day).collect();
            let pass = Pass {
                config,
                granularity: Granularity::Daily,
                periods: &periods,
                label: label.as_deref(),
            };
            self.run_pass(&pass, &symbols, &plan.intervals, &mut summary)
                .await;
        }

        info!(
            attempted = summary.totals.attempted,
            skipped = summary.totals.skipped,
            failed = summary.totals.failed,
            not_found = summary.totals.not_found,
            interrupted = summary.interrupted,
            "Run finished"
        );
        Ok(summary)
    }

    async fn resolve_symbols(&self, config: &RunConfig) -> Result<Vec<String>, DownloadError> {
        if !config.symbols.is_empty() {
            return Ok(config.symbols.clone());
        }

        let symbols = self
            .lister
            .list_symbols(config.trading_type)
            .await
            .map_err(DownloadError::SymbolListing)?;
        self.reporter.report(&ProgressEvent::SymbolsResolved {
            count: symbols.len(),
        });
        Ok(symbols)
    }

    async fn run_pass(
        &self,
        pass: &Pass<'_>,
        symbols: &[String],
        intervals: &[Interval],
        summary: &mut RunSummary,
    ) {
        let concurrency = pass.config.concurrency.max(1);

        for (index, symbol) in symbols.iter().enumerate() {
            if self.shutdown_requested() {
                summary.interrupted = true;
                break;
            }

            self.reporter.report(&ProgressEvent::SymbolStarted {
                granularity: pass.granularity,
                index: index + 1,
                total: symbols.len(),
                symbol: symbol.clone(),
            });

            let outcomes: Vec<PairOutcome> = stream::iter(intervals.iter().copied())
                .map(|interval| self.run_pair(pass, symbol, interval))
                .buffered(concurrency)
                .collect()
                .await;

            for outcome in outcomes {
                let stats = outcome.report.stats;
                if stats.skipped > 0 {
                    self.reporter.report(&ProgressEvent::PairSkipped {
                        symbol: outcome.report.symbol.clone(),
                        interval: outcome.report.interval,
                        skipped: stats.skipped,
                    });
                }
                self.reporter
                    .report(&ProgressEvent::PairFinished(outcome.report.clone()));

                summary.interrupted |= outcome.interrupted;
                summary.failures.extend(outcome.failures);
                summary.record_pair(outcome.report);
            }
        }
    }

    async fn run_pair(&self, pass: &Pass<'_>, symbol: &str, interval: Interval) -> PairOutcome {
        let config = pass.config;
        let remote = remote_path(
            config.trading_type,
            DataKind::Klines,
            pass.granularity,
            symbol,
            interval,
        );
        let dir = save_dir(&remote, pass.label, config.destination.as_deref());

        let existing = self.scanner.scan(&dir).unwrap_or_else(|e| {
            warn!(dir = %dir.display(), error = %e, "Failed to list save directory, treating as empty");
            ExistingFileSet::new()
        });

        let mut stats = RunStats::default();
        let mut failures = Vec::new();
        let mut interrupted = false;

        for period in pass.periods {
            let file_name = archive_file_name(symbol, interval, period);
            if existing.contains(&file_name) {
                stats.skipped += 1;
                continue;
            }
            if self.shutdown_requested() {
                interrupted = true;
                break;
            }

            let want_checksum =
                config.fetch_checksums && !existing.contains(&checksum_file_name(&file_name));
            let task = DownloadTask::new(remote.as_str(), file_name, want_checksum);
            let report = self.engine.fetch_task(&task, &dir).await;

            match report.archive {
                Ok(FetchOutcome::Downloaded { bytes, .. }) => {
                    stats.attempted += 1;
                    self.reporter.report(&ProgressEvent::FileDownloaded {
                        file_name: task.file_name().to_string(),
                        bytes,
                    });
                }
                Ok(FetchOutcome::AlreadyPresent) => stats.skipped += 1,
                Err(err) => {
                    let failure = self.record_failure(pass.granularity, task.file_name(), &err);
                    stats.failed += 1;
                    stats.not_found += u64::from(failure.not_found);
                    failures.push(failure);
                }
            }

            match report.checksum {
                Some(Ok(FetchOutcome::Downloaded { bytes, .. })) => {
                    self.reporter.report(&ProgressEvent::FileDownloaded {
                        file_name: task.checksum_file_name(),
                        bytes,
                    });
                }
                Some(Err(err)) => {
                    let failure =
                        self.record_failure(pass.granularity, &task.checksum_file_name(), &err);
                    stats.failed += 1;
                    stats.not_found += u64::from(failure.not_found);
                    failures.push(failure);
                }
                Some(Ok(FetchOutcome::AlreadyPresent)) | None => {}
            }
        }

        metrics::record_skipped(pass.granularity, stats.skipped);

        PairOutcome {
            report: PairReport {
                granularity: pass.granularity,
                symbol: symbol.to_string(),
                interval,
                stats,
            },
            failures,
            interrupted,
        }
    }

    fn record_failure(&self, granularity: Granularity, file_name: &str, err: &FetchError) -> FileFailure {
        let failure = FileFailure {
            file_name: file_name.to_string(),
            error: err.to_string(),
            not_found: err.is_not_found(),
        };
        if failure.not_found {
            metrics::record_not_found(granularity);
        } else {
            metrics::record_failure(granularity);
        }
        self.reporter.report(&ProgressEvent::FileFailed(failure.clone()));
        failure
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|s| s.is_shutdown_requested())
    }
}
