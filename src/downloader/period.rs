//! Period enumeration
//!
//! Turns the configured years, months and dates into the ordered list of
//! periods worth asking the archive for. Everything here is pure: the current
//! date is passed in, never read from the clock, so the same inputs always
//! produce the same periods.
//!
//! # Usage Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use kline_archive_downloader::downloader::period::{monthly_periods, EffectiveDateBound};
//! use kline_archive_downloader::TradingType;
//!
//! let today = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
//! let bound = EffectiveDateBound::resolve(TradingType::Spot, None, None, today);
//!
//! let periods = monthly_periods(&[2020, 2021], &[1, 6], &bound);
//! let labels: Vec<String> = periods.iter().map(|p| p.to_string()).collect();
//! assert_eq!(labels, ["2020-01", "2020-06", "2021-01"]);
//! ```

use crate::{Interval, TradingType};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Year and month of a monthly archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct YearMonth {
    /// Year (e.g., 2024)
    pub year: i32,
    /// Month (1-12)
    pub month: u32,
}

impl YearMonth {
    /// First day of the month, `None` for an out-of-range month
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Calendar period one archive file covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// Monthly archive
    Month(YearMonth),
    /// Daily archive
    Day(NaiveDate),
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month(ym) => ym.fmt(f),
            Period::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<YearMonth> for Period {
    fn from(ym: YearMonth) -> Self {
        Period::Month(ym)
    }
}

impl From<NaiveDate> for Period {
    fn from(date: NaiveDate) -> Self {
        Period::Day(date)
    }
}

/// Resolved `[start, end]` window of a run, inclusive at both ends
///
/// An inverted window is kept as given and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveDateBound {
    /// First date considered
    pub start: NaiveDate,
    /// Last date considered
    pub end: NaiveDate,
}

impl EffectiveDateBound {
    /// Apply defaults: the market's earliest archive date and `today`
    pub fn resolve(
        trading_type: TradingType,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        Self {
            start: start.unwrap_or_else(|| trading_type.earliest_archive_date()),
            end: end.unwrap_or(today),
        }
    }

    /// Whether `date` falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn contains_year(&self, year: i32) -> bool {
        self.start.year() <= year && year <= self.end.year()
    }
}

/// Monthly periods inside `bound`, in input order (years outer, months inner)
///
/// Years outside the bound's year range are dropped before the cross product.
/// A month is kept when its first day lies inside the bound, so a bound
/// starting mid-month excludes that month.
pub fn monthly_periods(years: &[i32], months: &[u32], bound: &EffectiveDateBound) -> Vec<YearMonth> {
    years
        .iter()
        .filter(|year| bound.contains_year(**year))
        .flat_map(|&year| months.iter().map(move |&month| YearMonth { year, month }))
        .filter(|ym| ym.first_day().is_some_and(|day| bound.contains(day)))
        .collect()
}

/// Intervals that have daily archives, first occurrence order, no duplicates
pub fn daily_intervals(intervals: &[Interval]) -> Vec<Interval> {
    let mut seen = HashSet::new();
    intervals
        .iter()
        .copied()
        .filter(|interval| interval.has_daily_archive() && seen.insert(*interval))
        .collect()
}

/// Daily periods inside `bound`, in input order
pub fn daily_periods(dates: &[NaiveDate], bound: &EffectiveDateBound) -> Vec<NaiveDate> {
    dates.iter().copied().filter(|d| bound.contains(*d)).collect()
}

/// Intervals and days the daily pass covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DailyPlan {
    /// Daily-valid intervals
    pub intervals: Vec<Interval>,
    /// Days inside the bound
    pub dates: Vec<NaiveDate>,
}

impl DailyPlan {
    /// Whether the plan yields no files at all
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty() || self.dates.is_empty()
    }
}

/// Build the daily pass: restrict intervals first, then filter dates
pub fn daily_plan(
    intervals: &[Interval],
    dates: &[NaiveDate],
    bound: &EffectiveDateBound,
) -> DailyPlan {
    DailyPlan {
        intervals: daily_intervals(intervals),
        dates: daily_periods(dates, bound),
    }
}
