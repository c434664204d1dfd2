//! Integration tests for logging and tracing

use kline_archive_downloader::downloader::{
    FileFailure, NullReporter, PairReport, ProgressEvent, ProgressReporter, RunStats,
    TracingReporter,
};
use kline_archive_downloader::{Granularity, Interval};
use std::io;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[test]
fn test_tracing_subscriber_initialization() {
    // Either succeeds or fails because already initialized (both are OK)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kline_archive_downloader=debug")),
        )
        .with_test_writer()
        .try_init();

    info!("This is an info message");
    warn!("This is a warning message");
    error!("This is an error message");
}

#[test]
fn test_tracing_json_format() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("kline_archive_downloader=info"))
        .with_test_writer()
        .try_init();

    info!(symbol = "BTCUSDT", interval = "1m", skipped = 3, "Skipped existing files");
}

#[test]
fn test_env_filter_parsing() {
    for directive in [
        "info",
        "kline_archive_downloader=debug",
        "warn,kline_archive_downloader=trace",
    ] {
        assert!(EnvFilter::try_new(directive).is_ok(), "{directive}");
    }
}

/// Writer appending formatted log lines to a shared buffer
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Run `f` with a subscriber writing into the returned capture
fn capture_logs(f: impl FnOnce()) -> Capture {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("kline_archive_downloader=trace"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    capture
}

fn every_event() -> Vec<ProgressEvent> {
    let report = PairReport {
        granularity: Granularity::Monthly,
        symbol: "BTCUSDT".to_string(),
        interval: Interval::OneMinute,
        stats: RunStats {
            attempted: 1,
            skipped: 2,
            failed: 1,
            not_found: 1,
        },
    };
    vec![
        ProgressEvent::SymbolsResolved { count: 1 },
        ProgressEvent::SymbolStarted {
            granularity: Granularity::Monthly,
            index: 1,
            total: 1,
            symbol: "BTCUSDT".to_string(),
        },
        ProgressEvent::FileDownloaded {
            file_name: "BTCUSDT-1m-2021-01.zip".to_string(),
            bytes: 1024,
        },
        ProgressEvent::FileFailed(FileFailure {
            file_name: "BTCUSDT-1m-2021-02.zip".to_string(),
            error: "HTTP 404".to_string(),
            not_found: true,
        }),
        ProgressEvent::FileFailed(FileFailure {
            file_name: "BTCUSDT-1m-2021-03.zip".to_string(),
            error: "network error".to_string(),
            not_found: false,
        }),
        ProgressEvent::PairSkipped {
            symbol: "BTCUSDT".to_string(),
            interval: Interval::OneMinute,
            skipped: 2,
        },
        ProgressEvent::PairFinished(report),
    ]
}

#[test]
fn test_tracing_reporter_logs_every_event() {
    let events = every_event();
    let logs = capture_logs(|| {
        for event in &events {
            TracingReporter.report(event);
        }
    })
    .text();

    assert!(logs.contains("Found 1 symbols"), "{logs}");
    assert!(logs.contains("[1/1] - start monthly download BTCUSDT klines"), "{logs}");
    assert!(logs.contains("Downloaded"), "{logs}");
    assert!(logs.contains("File not found in archive"), "{logs}");
    assert!(logs.contains("WARN"), "hard failures log at warn: {logs}");
    assert!(logs.contains("Download failed"), "{logs}");
    assert!(logs.contains("Skipped 2 existing files"), "{logs}");
    assert!(logs.contains("Pair finished"), "{logs}");
    assert_eq!(logs.lines().count(), events.len());
}

#[test]
fn test_null_reporter_logs_nothing() {
    let events = every_event();
    let logs = capture_logs(|| {
        for event in &events {
            NullReporter.report(event);
        }
    });
    assert!(logs.text().is_empty());
}
