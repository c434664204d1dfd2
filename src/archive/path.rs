//! Remote path, URL and local directory construction
//!
//! Pure functions mapping logical coordinates (trading type, data kind,
//! granularity, symbol, interval, period) to:
//!
//! - a remote relative path such as `data/spot/monthly/klines/BTCUSDT/1m/`
//! - a file name such as `BTCUSDT-1m-2021-01.zip`
//! - a fully encoded download URL
//! - the local directory the file is saved in
//!
//! The scanner and the engine both go through these functions, so they always
//! agree on where a file lives.
//!
//! # Usage Example
//!
//! ```rust
//! use kline_archive_downloader::archive::path::{archive_url, remote_path, BASE_URL};
//! use kline_archive_downloader::{DataKind, Granularity, Interval, TradingType};
//!
//! let path = remote_path(
//!     TradingType::Spot,
//!     DataKind::Klines,
//!     Granularity::Monthly,
//!     "btcusdt",
//!     Interval::OneMinute,
//! );
//! assert_eq!(path, "data/spot/monthly/klines/BTCUSDT/1m/");
//!
//! let url = archive_url(BASE_URL, &path, "BTCUSDT-1m-2021-01.zip");
//! assert_eq!(
//!     url,
//!     "https://data.binance.vision/data/spot/monthly/klines/BTCUSDT/1m/BTCUSDT-1m-2021-01.zip"
//! );
//! ```

use crate::downloader::period::Period;
use crate::{DataKind, Granularity, Interval, TradingType};
use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};

/// Archive root every relative path is joined to
pub const BASE_URL: &str = "https://data.binance.vision/";

/// Suffix of checksum sidecar files
pub const CHECKSUM_SUFFIX: &str = ".CHECKSUM";

/// Characters left alone in the path part: unreserved punctuation and `/`.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Characters left alone in the file name part: unreserved punctuation only.
const FILE_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Remote relative path for one (symbol, interval) directory, with trailing `/`
pub fn remote_path(
    trading_type: TradingType,
    kind: DataKind,
    granularity: Granularity,
    symbol: &str,
    interval: Interval,
) -> String {
    format!(
        "{}/{}/{}/{}/{}/",
        trading_type.market().archive_prefix,
        granularity,
        kind,
        symbol.to_uppercase(),
        interval
    )
}

/// Full download URL for a file
///
/// The path keeps its `/` separators; every other reserved or non-ASCII byte is
/// percent-encoded. The file name is encoded separately so `/` inside it would
/// be escaped too. The local file name is never touched by this encoding.
pub fn archive_url(base_url: &str, remote_path: &str, file_name: &str) -> String {
    format!(
        "{}{}{}",
        base_url,
        utf8_percent_encode(remote_path, PATH_ENCODE_SET),
        utf8_percent_encode(file_name, FILE_NAME_ENCODE_SET)
    )
}

/// Label for runs scoped to an explicit date window
///
/// Only produced when both bounds were supplied, so such runs land in their own
/// directory instead of mixing with full-history downloads.
pub fn date_range_label(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{start} {end}").replace(' ', "_")),
        _ => None,
    }
}

/// Local directory files for `remote_path` are saved in
///
/// Layout: `<destination?>/<remote_path>[/<date_range_label>]`. Segments that
/// would escape the destination (`.` and `..`) are neutralised.
pub fn save_dir(
    remote_path: &str,
    date_range_label: Option<&str>,
    destination: Option<&Path>,
) -> PathBuf {
    let mut dir = destination.map(Path::to_path_buf).unwrap_or_default();
    for segment in remote_path.split('/').filter(|s| !s.is_empty()) {
        dir.push(sanitize_segment(segment));
    }
    if let Some(label) = date_range_label {
        dir.push(sanitize_segment(&label.replace(' ', "_")));
    }
    dir
}

/// Archive file name for a period
pub fn archive_file_name(symbol: &str, interval: Interval, period: &Period) -> String {
    format!("{}-{}-{}.zip", symbol.to_uppercase(), interval, period)
}

/// Checksum sidecar name for an archive file
pub fn checksum_file_name(file_name: &str) -> String {
    format!("{file_name}{CHECKSUM_SUFFIX}")
}

fn sanitize_segment(segment: &str) -> String {
    match segment {
        "." | ".." => "_".repeat(segment.len()),
        other => other.replace('\\', "_"),
    }
}
