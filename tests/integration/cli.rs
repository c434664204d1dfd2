//! Binary smoke tests

use assert_cmd::Command;
use tempfile::TempDir;

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("kline-archive-downloader").unwrap();
    cmd.env_remove("STORE_DIRECTORY").env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let assert = bin().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("download"));
    assert!(stdout.contains("symbols"));
}

#[test]
fn test_invalid_interval_rejected() {
    let assert = bin()
        .args(["download", "-s", "BTCUSDT", "-i", "2m"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("Invalid interval"), "stderr: {stderr}");
}

#[test]
fn test_invalid_month_rejected() {
    bin()
        .args(["download", "-s", "BTCUSDT", "-m", "13"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_date_rejected() {
    bin()
        .args(["download", "-s", "BTCUSDT", "-d", "2024-13-01"])
        .assert()
        .failure();
}

#[test]
fn test_both_passes_skipped_succeeds_offline() {
    let temp = TempDir::new().unwrap();
    let assert = bin()
        .args(["download", "-s", "BTCUSDT", "--skip-monthly", "--skip-daily", "--folder"])
        .arg(temp.path())
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("Download completed successfully!"), "stdout: {stdout}");
    assert!(stdout.contains("Downloaded: 0"));
}

#[test]
fn test_json_summary() {
    let temp = TempDir::new().unwrap();
    let assert = bin()
        .args([
            "--output-format",
            "json",
            "download",
            "-s",
            "BTCUSDT",
            "--skip-monthly",
            "--skip-daily",
        ])
        .env("STORE_DIRECTORY", temp.path())
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let json: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["trading_type"], "spot");
    assert_eq!(json["totals"]["attempted"], 0);
    assert_eq!(
        json["destination"],
        temp.path().display().to_string(),
        "STORE_DIRECTORY is the default folder"
    );
}
