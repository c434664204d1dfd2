//! Download command implementation

use crate::archive::http::{ReqwestTransport, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::archive::symbols::ExchangeInfoLister;
use crate::downloader::config::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MAX_RETRIES};
use crate::downloader::{BatchOrchestrator, DownloadEngine, RetryPolicy, RunConfig, RunSummary};
use crate::shutdown::SharedShutdown;
use crate::{Interval, TradingType};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::progress::ConsoleReporter;
use super::{CliError, SymbolsCommand};

/// Parse a `YYYY-MM-DD` date
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("'{s}' is not a valid YYYY-MM-DD date: {e}"))
}

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Kline Archive Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "kline-archive-downloader")]
#[command(about = "Download kline archives from Binance Vision", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Maximum number of retries for transient network failures (range: 1-20)
    #[arg(long, global = true, default_value_t = MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// Overall timeout for one HTTP request, body included, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Serve Prometheus metrics on this address (e.g., 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// HTTP transport configured from the global flags
    pub fn transport(&self) -> Result<ReqwestTransport, CliError> {
        Ok(ReqwestTransport::new(Duration::from_secs(self.timeout_secs))?)
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download monthly and daily kline archives
    Download(DownloadArgs),

    /// List the symbols a market currently trades
    Symbols(SymbolsCommand),
}

/// Download command arguments
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Trading type: spot, um or cm
    #[arg(short = 't', long = "type", default_value = "spot")]
    pub trading_type: TradingType,

    /// Symbols to download (default: every symbol the market lists)
    #[arg(short, long, num_args = 1..)]
    pub symbols: Vec<String>,

    /// Intervals (default: all of 1s 1m 3m 5m 15m 30m 1h 2h 4h 6h 8h 12h 1d 3d 1w 1mo)
    #[arg(short, long, num_args = 1..)]
    pub intervals: Vec<Interval>,

    /// Years for monthly archives (default: 2017 through the current year)
    #[arg(short, long, num_args = 1..)]
    pub years: Vec<i32>,

    /// Months 1-12 for monthly archives (default: all)
    #[arg(short, long, num_args = 1.., value_parser = clap::value_parser!(u32).range(1..=12))]
    pub months: Vec<u32>,

    /// Explicit days (YYYY-MM-DD) for daily archives; disables the monthly pass
    #[arg(short, long, num_args = 1.., value_parser = parse_date)]
    pub dates: Vec<NaiveDate>,

    /// Earliest date to download (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Latest date to download (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// Root folder to store files under (default: current directory)
    #[arg(long, env = "STORE_DIRECTORY")]
    pub folder: Option<PathBuf>,

    /// Also download the .CHECKSUM sidecar of every archive
    #[arg(short = 'c', long, default_value_t = false)]
    pub checksum: bool,

    /// Skip monthly archives
    #[arg(long, default_value_t = false)]
    pub skip_monthly: bool,

    /// Skip daily archives
    #[arg(long, default_value_t = false)]
    pub skip_daily: bool,

    /// Number of (symbol, interval) pairs downloaded at once (max: 32)
    ///
    /// 1 downloads strictly one file at a time. The archive throttles by client
    /// IP, so keep this small.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_concurrency)]
    pub concurrency: usize,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

impl DownloadArgs {
    /// Build the run configuration, filling defaults for omitted lists
    pub fn to_run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(self.trading_type);
        config.symbols = self.symbols.iter().map(|s| s.to_uppercase()).collect();
        if !self.intervals.is_empty() {
            config.intervals = self.intervals.clone();
        }
        if !self.years.is_empty() {
            config.years = self.years.clone();
        }
        if !self.months.is_empty() {
            config.months = self.months.clone();
        }
        if !self.dates.is_empty() {
            config.dates = Some(self.dates.clone());
        }
        config.start_date = self.start_date;
        config.end_date = self.end_date;
        config.destination = self.folder.clone();
        config.fetch_checksums = self.checksum;
        config.skip_monthly = self.skip_monthly;
        config.skip_daily = self.skip_daily;
        config.concurrency = self.concurrency;
        config
    }

    /// Execute the download command
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = self.to_run_config();
        let today = Utc::now().date_naive();

        if let (Some(start), Some(end)) = (config.start_date, config.end_date) {
            if start > end {
                warn!(%start, %end, "Start date is after end date, nothing will match");
            }
        }

        let transport = Arc::new(cli.transport()?);
        let engine = DownloadEngine::new(transport.clone())
            .with_retry_policy(RetryPolicy::with_max_retries(cli.max_retries))
            .with_shutdown(shutdown.clone());

        let reporter = Arc::new(match cli.output_format {
            OutputFormat::Human => ConsoleReporter::new(),
            OutputFormat::Json => ConsoleReporter::hidden(),
        });

        let orchestrator = BatchOrchestrator::new(engine, ExchangeInfoLister::new(transport))
            .with_reporter(reporter.clone())
            .with_shutdown(shutdown);

        info!(
            trading_type = %config.trading_type,
            symbols = config.symbols.len(),
            intervals = config.intervals.len(),
            monthly = config.runs_monthly(),
            daily = config.runs_daily(),
            concurrency = config.concurrency,
            "Starting archive download"
        );

        let result = orchestrator.run(&config, today).await;
        reporter.finish();
        let summary = result?;

        match cli.output_format {
            OutputFormat::Json => output_json(&config, &summary)?,
            OutputFormat::Human => output_human(&summary),
        }

        summary.ensure_success()?;
        Ok(())
    }
}

/// Output the run summary as JSON
fn output_json(config: &RunConfig, summary: &RunSummary) -> Result<(), CliError> {
    let output = serde_json::json!({
        "success": summary.ensure_success().is_ok(),
        "trading_type": config.trading_type,
        "destination": config.destination.as_ref().map(|p| p.display().to_string()),
        "totals": summary.totals,
        "interrupted": summary.interrupted,
        "pairs": summary.pairs,
        "failures": summary.failures,
    });

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

/// Output the run summary in human-readable format
fn output_human(summary: &RunSummary) {
    let totals = &summary.totals;
    match summary.ensure_success() {
        Ok(()) => println!("\nDownload completed successfully!"),
        Err(e) => {
            eprintln!("\nDownload finished with errors!");
            eprintln!("Error: {e}");
            error!("Download failed: {}", e);
        }
    }
    println!("Downloaded: {}", totals.attempted);
    println!("Skipped (already present): {}", totals.skipped);
    if totals.not_found > 0 {
        println!("Not in archive: {}", totals.not_found);
    }
    if totals.hard_failures() > 0 {
        println!("Failed: {}", totals.hard_failures());
        for failure in summary.failures.iter().filter(|f| !f.not_found) {
            eprintln!("  {}: {}", failure.file_name, failure.error);
        }
    }
}
