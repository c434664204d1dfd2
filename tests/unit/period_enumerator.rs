//! Property tests for period enumeration
//!
//! Whatever order the caller lists years, months and dates in:
//! 1. No period outside the effective bound is produced
//! 2. Every produced period comes from the input lists, in input order
//! 3. Daily intervals never include bars longer than a day

use chrono::{Datelike, Duration, NaiveDate};
use kline_archive_downloader::downloader::period::{
    daily_intervals, daily_plan, monthly_periods, EffectiveDateBound,
};
use kline_archive_downloader::{Interval, TradingType};
use proptest::prelude::*;
use std::collections::HashSet;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..4000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2016, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn arb_bound() -> impl Strategy<Value = EffectiveDateBound> {
    (arb_date(), arb_date()).prop_map(|(start, end)| EffectiveDateBound { start, end })
}

fn arb_interval() -> impl Strategy<Value = Interval> {
    (0usize..Interval::ALL.len()).prop_map(|i| Interval::ALL[i])
}

// ── Monthly ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn monthly_periods_stay_inside_bound(
        years in prop::collection::vec(2014i32..2030, 0..8),
        months in prop::collection::vec(0u32..14, 0..14),
        bound in arb_bound(),
    ) {
        for ym in monthly_periods(&years, &months, &bound) {
            let first = ym.first_day().unwrap();
            prop_assert!(bound.contains(first), "{} outside {:?}", ym, bound);
            prop_assert!(years.contains(&ym.year));
            prop_assert!(months.contains(&ym.month));
        }
    }

    #[test]
    fn monthly_periods_follow_input_order(
        years in prop::collection::vec(2017i32..2025, 1..5),
        months in prop::collection::vec(1u32..=12, 1..6),
    ) {
        let bound = EffectiveDateBound {
            start: NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        };
        let expected: Vec<(i32, u32)> = years
            .iter()
            .flat_map(|&y| months.iter().map(move |&m| (y, m)))
            .collect();
        let produced: Vec<(i32, u32)> = monthly_periods(&years, &months, &bound)
            .iter()
            .map(|ym| (ym.year, ym.month))
            .collect();
        prop_assert_eq!(produced, expected);
    }
}

// ── Daily ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn daily_plan_respects_bound_and_intervals(
        dates in prop::collection::vec(arb_date(), 0..30),
        intervals in prop::collection::vec(arb_interval(), 0..20),
        bound in arb_bound(),
    ) {
        let plan = daily_plan(&intervals, &dates, &bound);

        for date in &plan.dates {
            prop_assert!(bound.contains(*date));
        }
        let kept = dates.iter().filter(|d| bound.contains(**d)).count();
        prop_assert_eq!(plan.dates.len(), kept);

        for interval in &plan.intervals {
            prop_assert!(interval.has_daily_archive());
            prop_assert!(intervals.contains(interval));
        }
        let unique: HashSet<Interval> = plan.intervals.iter().copied().collect();
        prop_assert_eq!(unique.len(), plan.intervals.len());
    }
}

#[test]
fn test_daily_subset_is_one_second_through_one_day() {
    let daily = daily_intervals(&Interval::ALL);
    assert_eq!(daily.first(), Some(&Interval::OneSecond));
    assert_eq!(daily.last(), Some(&Interval::OneDay));
    assert_eq!(daily.len(), 13);
}

#[test]
fn test_default_bound_per_trading_type() {
    let today = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
    let spot = EffectiveDateBound::resolve(TradingType::Spot, None, None, today);
    let um = EffectiveDateBound::resolve(TradingType::UsdMargined, None, None, today);

    assert_eq!(spot.start.year(), 2017);
    assert_eq!(um.start.year(), 2020);
    assert_eq!(spot.end, today);

    // Spot has three more years of monthly candidates
    let years: Vec<i32> = (2017..=2025).collect();
    let months: Vec<u32> = (1..=12).collect();
    let spot_count = monthly_periods(&years, &months, &spot).len();
    let um_count = monthly_periods(&years, &months, &um).len();
    assert_eq!(spot_count - um_count, 36);
    assert_eq!(um_count, 5 * 12 + 2);
}
