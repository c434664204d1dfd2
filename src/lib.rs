//! # Kline Archive Downloader
//!
//! Enumerates and fetches the time-partitioned kline archives published on
//! Binance Vision (`https://data.binance.vision`), skipping files that are
//! already present on disk so interrupted runs can simply be restarted.
//!
//! ## Features
//!
//! - **All market segments**: spot, USD-margined (`um`) and coin-margined (`cm`) futures
//! - **Monthly and daily archives**: period enumeration bounded by an explicit date window
//! - **Resumable**: one directory listing per symbol/interval decides what to skip
//! - **Reliable fetches**: bounded retries with backoff, request timeouts, atomic writes
//! - **Checksum sidecars**: optional `.CHECKSUM` companions saved next to each archive
//!
//! ## Quick Start
//!
//! ```no_run
//! use kline_archive_downloader::downloader::{BatchOrchestrator, DownloadEngine, RunConfig};
//! use kline_archive_downloader::archive::{http::ReqwestTransport, symbols::ExchangeInfoLister};
//! use kline_archive_downloader::{Interval, TradingType};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = RunConfig::new(TradingType::Spot);
//! config.symbols = vec!["BTCUSDT".to_string()];
//! config.intervals = vec![Interval::OneMinute];
//! config.years = vec![2021];
//! config.months = vec![1];
//! config.fetch_checksums = true;
//!
//! let transport = Arc::new(ReqwestTransport::with_default_timeout()?);
//! let engine = DownloadEngine::new(transport.clone());
//! let summary = BatchOrchestrator::new(engine, ExchangeInfoLister::new(transport))
//!     .run(&config, chrono::Utc::now().date_naive())
//!     .await?;
//! println!("downloaded {} files", summary.totals.attempted);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`archive`] - remote side: paths and URLs, HTTP transport, symbol discovery
//! - [`downloader`] - period enumeration, existing-file scan, fetch engine, batch orchestration
//! - [`cli`] - command line front end
//! - [`metrics`] - counters and optional Prometheus exporter
//! - [`shutdown`] - cooperative cancellation

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Remote archive side: paths, transport and symbol discovery
pub mod archive;

/// CLI command implementations
pub mod cli;

/// Enumeration, scanning, fetching and batch orchestration
pub mod downloader;

/// Download metrics
pub mod metrics;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Market segment an archive belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingType {
    /// Spot market
    #[serde(rename = "spot")]
    Spot,
    /// USD-margined futures
    #[serde(rename = "um")]
    UsdMargined,
    /// Coin-margined futures
    #[serde(rename = "cm")]
    CoinMargined,
}

impl TradingType {
    /// Every trading type, in CLI order
    pub const ALL: [TradingType; 3] = [
        TradingType::Spot,
        TradingType::UsdMargined,
        TradingType::CoinMargined,
    ];

    /// Short code used on the command line and in remote paths
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingType::Spot => "spot",
            TradingType::UsdMargined => "um",
            TradingType::CoinMargined => "cm",
        }
    }
}

impl std::fmt::Display for TradingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(TradingType::Spot),
            "um" => Ok(TradingType::UsdMargined),
            "cm" => Ok(TradingType::CoinMargined),
            _ => Err(format!("Invalid trading type: {s}. Valid options: spot, um, cm")),
        }
    }
}

/// Archive partitioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// One archive per calendar month
    #[serde(rename = "monthly")]
    Monthly,
    /// One archive per calendar day
    #[serde(rename = "daily")]
    Daily,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Granularity::Monthly => "monthly",
            Granularity::Daily => "daily",
        })
    }
}

/// Kind of market data stored in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// Candlestick bars
    #[serde(rename = "klines")]
    Klines,
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataKind::Klines => "klines",
        })
    }
}

/// Candle resolution encoded in archive paths and file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// 1 second
    #[serde(rename = "1s")]
    OneSecond,
    /// 1 minute
    #[serde(rename = "1m")]
    OneMinute,
    /// 3 minutes
    #[serde(rename = "3m")]
    ThreeMinutes,
    /// 5 minutes
    #[serde(rename = "5m")]
    FiveMinutes,
    /// 15 minutes
    #[serde(rename = "15m")]
    FifteenMinutes,
    /// 30 minutes
    #[serde(rename = "30m")]
    ThirtyMinutes,
    /// 1 hour
    #[serde(rename = "1h")]
    OneHour,
    /// 2 hours
    #[serde(rename = "2h")]
    TwoHours,
    /// 4 hours
    #[serde(rename = "4h")]
    FourHours,
    /// 6 hours
    #[serde(rename = "6h")]
    SixHours,
    /// 8 hours
    #[serde(rename = "8h")]
    EightHours,
    /// 12 hours
    #[serde(rename = "12h")]
    TwelveHours,
    /// 1 day
    #[serde(rename = "1d")]
    OneDay,
    /// 3 days
    #[serde(rename = "3d")]
    ThreeDays,
    /// 1 week
    #[serde(rename = "1w")]
    OneWeek,
    /// 1 month
    #[serde(rename = "1mo")]
    OneMonth,
}

impl Interval {
    /// The full interval vocabulary, shortest first
    pub const ALL: [Interval; 16] = [
        Interval::OneSecond,
        Interval::OneMinute,
        Interval::ThreeMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::TwoHours,
        Interval::FourHours,
        Interval::SixHours,
        Interval::EightHours,
        Interval::TwelveHours,
        Interval::OneDay,
        Interval::ThreeDays,
        Interval::OneWeek,
        Interval::OneMonth,
    ];

    /// Whether daily archives are published for this interval.
    ///
    /// Bars longer than a day do not fit in a one-day file.
    pub fn has_daily_archive(&self) -> bool {
        !matches!(
            self,
            Interval::ThreeDays | Interval::OneWeek | Interval::OneMonth
        )
    }

    /// Label used in remote paths and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneSecond => "1s",
            Interval::OneMinute => "1m",
            Interval::ThreeMinutes => "3m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::TwoHours => "2h",
            Interval::FourHours => "4h",
            Interval::SixHours => "6h",
            Interval::EightHours => "8h",
            Interval::TwelveHours => "12h",
            Interval::OneDay => "1d",
            Interval::ThreeDays => "3d",
            Interval::OneWeek => "1w",
            Interval::OneMonth => "1mo",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .iter()
            .copied()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| format!("Invalid interval: {s}"))
    }
}
