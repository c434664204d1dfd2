//! Download configuration: retry policy, run plan and defaults

use crate::archive::path::date_range_label;
use crate::archive::FetchError;
use crate::{Interval, TradingType};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use std::path::PathBuf;
use std::time::Duration;

use super::period::EffectiveDateBound;

/// Maximum number of retries after the first attempt.
/// 5 retries with exponential backoff rides out short network outages
/// without stalling the batch for more than about a minute per file.
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds
pub const MAX_BACKOFF_MS: u64 = 30000;

/// Default number of (symbol, interval) pairs processed at once.
/// 1 keeps the run fully sequential.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Upper bound on concurrency to stay polite with the archive host
pub const MAX_CONCURRENCY: usize = 32;

/// First year archives exist for any market
pub const FIRST_ARCHIVE_YEAR: i32 = 2017;

/// Start of the generated daily date list when no start date is given
pub const DEFAULT_DAILY_START: (i32, u32, u32) = (2020, 1, 1);

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    RetryPolicy::default().backoff(retry_count)
}

/// Retry policy for a single file fetch
///
/// Bundles the attempt budget, the backoff curve and the retryable-error
/// predicate so the engine can be driven deterministically in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Cap on any single delay
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Default curve with a custom retry budget
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry_count` (0-based), doubling each time
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let factor = 2u32.checked_pow(retry_count).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Whether `err` on attempt `attempt` (1-based) warrants another try
    pub fn should_retry(&self, err: &FetchError, attempt: u32) -> bool {
        err.is_retryable() && attempt < self.max_attempts()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

/// Waits out a backoff delay
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Validated configuration for one batch run
///
/// Read-only once the run starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Market segment
    pub trading_type: TradingType,
    /// Symbols to download; empty means "every listed symbol"
    pub symbols: Vec<String>,
    /// Intervals, in processing order
    pub intervals: Vec<Interval>,
    /// Years considered for monthly archives
    pub years: Vec<i32>,
    /// Months (1-12) considered for monthly archives
    pub months: Vec<u32>,
    /// Explicit days for daily archives; `None` generates a range up to today
    pub dates: Option<Vec<NaiveDate>>,
    /// Lower date bound override
    pub start_date: Option<NaiveDate>,
    /// Upper date bound override
    pub end_date: Option<NaiveDate>,
    /// Root folder files are stored under
    pub destination: Option<PathBuf>,
    /// Also fetch `.CHECKSUM` sidecars
    pub fetch_checksums: bool,
    /// Skip the monthly pass
    pub skip_monthly: bool,
    /// Skip the daily pass
    pub skip_daily: bool,
    /// (symbol, interval) pairs processed concurrently
    pub concurrency: usize,
}

impl RunConfig {
    /// Configuration with every default filled in
    pub fn new(trading_type: TradingType) -> Self {
        Self {
            trading_type,
            symbols: Vec::new(),
            intervals: Interval::ALL.to_vec(),
            years: (FIRST_ARCHIVE_YEAR..=Utc::now().year()).collect(),
            months: (1..=12).collect(),
            dates: None,
            start_date: None,
            end_date: None,
            destination: None,
            fetch_checksums: false,
            skip_monthly: false,
            skip_daily: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Date window for this run, resolved against `today`
    pub fn bound(&self, today: NaiveDate) -> EffectiveDateBound {
        EffectiveDateBound::resolve(self.trading_type, self.start_date, self.end_date, today)
    }

    /// Extra directory segment for runs with both bounds given
    pub fn date_range_label(&self) -> Option<String> {
        date_range_label(self.start_date, self.end_date)
    }

    /// Whether the monthly pass runs
    ///
    /// An explicit date list narrows the run to those days, so monthly archives
    /// are only considered when dates are generated.
    pub fn runs_monthly(&self) -> bool {
        !self.skip_monthly && self.dates.is_none()
    }

    /// Whether the daily pass runs
    pub fn runs_daily(&self) -> bool {
        !self.skip_daily
    }

    /// Candidate days for the daily pass
    ///
    /// The explicit list when given, otherwise every day from the start date
    /// (or [`DEFAULT_DAILY_START`]) through `today`.
    pub fn daily_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        if let Some(dates) = &self.dates {
            return dates.clone();
        }

        let (year, month, day) = DEFAULT_DAILY_START;
        let first = self
            .start_date
            .or_else(|| NaiveDate::from_ymd_opt(year, month, day))
            .unwrap_or(today);

        first.iter_days().take_while(|d| *d <= today).collect()
    }
}
