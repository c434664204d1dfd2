//! Download engine retry and write behaviour

use super::support::{transient, RecordingSleeper, ScriptedTransport};
use kline_archive_downloader::archive::path::{archive_url, remote_path, BASE_URL};
use kline_archive_downloader::archive::FetchError;
use kline_archive_downloader::downloader::{DownloadEngine, FetchOutcome, RetryPolicy};
use kline_archive_downloader::{DataKind, Granularity, Interval, TradingType};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const REMOTE: &str = "data/spot/monthly/klines/BTCUSDT/1m/";
const FILE: &str = "BTCUSDT-1m-2021-01.zip";

fn engine(transport: Arc<ScriptedTransport>, sleeper: Arc<RecordingSleeper>) -> DownloadEngine {
    DownloadEngine::new(transport).with_sleeper(sleeper)
}

#[tokio::test]
async fn test_two_transient_failures_then_success() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new().with_script(
        FILE,
        vec![transient(), transient(), Ok(b"archive".to_vec())],
    ));
    let sleeper = Arc::new(RecordingSleeper::default());

    let outcome = engine(transport.clone(), sleeper.clone())
        .fetch(REMOTE, FILE, temp.path())
        .await
        .expect("third attempt should succeed");

    assert_eq!(
        outcome,
        FetchOutcome::Downloaded {
            bytes: 7,
            attempts: 3
        }
    );
    assert_eq!(transport.request_count(), 3, "exactly 3 attempts");
    assert_eq!(
        sleeper.waits(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)],
        "exactly 2 backoff waits, doubling"
    );
    assert_eq!(std::fs::read(temp.path().join(FILE)).unwrap(), b"archive");
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new().with_missing(FILE));
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = engine(transport.clone(), sleeper.clone())
        .fetch(REMOTE, FILE, temp.path())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(transport.request_count(), 1, "exactly 1 attempt");
    assert!(sleeper.waits().is_empty(), "no backoff for an explicit status");
    assert!(!temp.path().join(FILE).exists());
}

#[tokio::test]
async fn test_server_error_status_is_not_retried() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new().with_script(
        FILE,
        vec![Err(FetchError::HttpStatus {
            status: 503,
            url: FILE.to_string(),
        })],
    ));
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = engine(transport.clone(), sleeper.clone())
        .fetch(REMOTE, FILE, temp.path())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
    assert!(!err.is_not_found());
    assert_eq!(transport.request_count(), 1);
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        ScriptedTransport::new().with_script(FILE, vec![transient(), transient(), transient()]),
    );
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = engine(transport.clone(), sleeper.clone())
        .with_retry_policy(RetryPolicy::with_max_retries(2))
        .fetch(REMOTE, FILE, temp.path())
        .await
        .unwrap_err();

    match err {
        FetchError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.is_retryable());
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 3);
    assert_eq!(sleeper.waits().len(), 2);
}

#[tokio::test]
async fn test_local_io_error_is_not_retried() {
    let temp = TempDir::new().unwrap();
    // A regular file where the save directory should be
    let blocker = temp.path().join("blocked");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let transport = Arc::new(ScriptedTransport::new());
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = engine(transport.clone(), sleeper.clone())
        .fetch(REMOTE, FILE, &blocker.join("nested"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::IoError(_)), "got {err:?}");
    assert_eq!(transport.request_count(), 1);
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_missing_directories_are_created() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new());
    let sleeper = Arc::new(RecordingSleeper::default());
    let dir = temp.path().join("data/spot/monthly/klines/BTCUSDT/1m");

    engine(transport, sleeper)
        .fetch(REMOTE, FILE, &dir)
        .await
        .unwrap();

    assert!(dir.join(FILE).is_file());
    let names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec![FILE.to_string()], "no temp files left behind");
}

#[tokio::test]
async fn test_non_ascii_symbol_url_and_local_name() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::new());
    let sleeper = Arc::new(RecordingSleeper::default());

    let remote = remote_path(
        TradingType::UsdMargined,
        DataKind::Klines,
        Granularity::Monthly,
        "币安人生USDT",
        Interval::OneMinute,
    );
    let file = "币安人生USDT-1m-2026-01.zip";

    engine(transport.clone(), sleeper)
        .fetch(&remote, file, temp.path())
        .await
        .unwrap();

    let requested = transport.requests();
    assert_eq!(requested, vec![archive_url(BASE_URL, &remote, file)]);
    assert!(requested[0].is_ascii());
    assert!(requested[0].contains("/data/futures/um/monthly/klines/"));
    assert!(temp.path().join(file).exists(), "local name stays byte-identical");
}

#[tokio::test]
async fn test_checksum_failure_keeps_archive() {
    let temp = TempDir::new().unwrap();
    let checksum = format!("{FILE}.CHECKSUM");
    let transport = Arc::new(ScriptedTransport::new().with_missing(&checksum));
    let sleeper = Arc::new(RecordingSleeper::default());
    let task = kline_archive_downloader::downloader::DownloadTask::new(REMOTE, FILE, true);

    let report = engine(transport.clone(), sleeper)
        .fetch_task(&task, temp.path())
        .await;

    assert!(matches!(report.archive, Ok(FetchOutcome::Downloaded { .. })));
    assert!(report.checksum.unwrap().unwrap_err().is_not_found());
    assert!(temp.path().join(FILE).exists());
    assert_eq!(transport.request_count(), 2);
}
