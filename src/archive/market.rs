//! Per-market archive configuration
//!
//! Spot, USD-margined and coin-margined archives differ only in their remote path
//! prefix, the exchange-info endpoint that lists their symbols and the first date
//! for which monthly archives exist. Keeping those differences as data means the
//! rest of the downloader never branches on the trading type.

use crate::TradingType;
use chrono::NaiveDate;

/// Configuration for one market segment
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Remote path prefix under the archive root (e.g., `data/futures/um`)
    pub archive_prefix: &'static str,

    /// Exchange-info endpoint listing the market's symbols
    pub exchange_info_url: &'static str,

    /// Earliest archive date as (year, month, day)
    pub earliest_archive: (i32, u32, u32),
}

/// Spot market
pub const SPOT_CONFIG: MarketConfig = MarketConfig {
    archive_prefix: "data/spot",
    exchange_info_url: "https://api.binance.com/api/v3/exchangeInfo",
    earliest_archive: (2017, 1, 1),
};

/// USD-margined futures (FAPI)
///
/// One revision of the archive tooling listed a later start for this market.
/// 2020-01-01 is used here; earlier months simply come back as not found.
pub const USD_MARGINED_CONFIG: MarketConfig = MarketConfig {
    archive_prefix: "data/futures/um",
    exchange_info_url: "https://fapi.binance.com/fapi/v1/exchangeInfo",
    earliest_archive: (2020, 1, 1),
};

/// Coin-margined futures (DAPI)
pub const COIN_MARGINED_CONFIG: MarketConfig = MarketConfig {
    archive_prefix: "data/futures/cm",
    exchange_info_url: "https://dapi.binance.com/dapi/v1/exchangeInfo",
    earliest_archive: (2020, 1, 1),
};

impl MarketConfig {
    /// Earliest date archives are published for this market
    pub fn earliest_archive_date(&self) -> NaiveDate {
        let (year, month, day) = self.earliest_archive;
        // The constants above are valid calendar dates
        NaiveDate::from_ymd_opt(year, month, day).expect("valid earliest archive date")
    }
}

impl TradingType {
    /// Market configuration for this trading type
    pub fn market(&self) -> &'static MarketConfig {
        match self {
            TradingType::Spot => &SPOT_CONFIG,
            TradingType::UsdMargined => &USD_MARGINED_CONFIG,
            TradingType::CoinMargined => &COIN_MARGINED_CONFIG,
        }
    }

    /// Default lower date bound when the user gives no start date
    pub fn earliest_archive_date(&self) -> NaiveDate {
        self.market().earliest_archive_date()
    }
}
