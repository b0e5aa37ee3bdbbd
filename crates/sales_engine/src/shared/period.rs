//! Period keys: parsing, display labels and bucketing.
//!
//! Canonical keys are zero-padded "YYYY-MM" (month) or "YYYY-MM-DD" (day),
//! so lexical order equals chronological order.

use chrono::{Datelike, NaiveDate};
use contracts::dashboards::d410_sales_overview::PeriodGranularity;
use std::ops::RangeInclusive;

use crate::shared::error::{EngineError, EngineResult};

/// Years that fit a zero-padded four digit key
const KEY_YEARS: RangeInclusive<i32> = 1..=9999;

/// Widest accepted date range, in days (ten years of daily buckets)
pub const MAX_RANGE_DAYS: i64 = 3660;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodKey {
    Month { year: i32, month: u32 },
    Day(NaiveDate),
}

impl PeriodKey {
    /// Parse "2024-03", "2024-3", "2024-03-15" or "2024-03-15T10:00:00Z".
    pub fn parse(raw: &str) -> Option<Self> {
        let date_part = raw
            .trim()
            .split(|c: char| c == 'T' || c == ' ')
            .next()
            .unwrap_or_default();
        let parts: Vec<&str> = date_part.split('-').collect();

        match parts.as_slice() {
            [y, m] => {
                let year: i32 = y.parse().ok()?;
                let month: u32 = m.parse().ok()?;
                if (1..=12).contains(&month) && KEY_YEARS.contains(&year) {
                    Some(PeriodKey::Month { year, month })
                } else {
                    None
                }
            }
            [y, m, d] => {
                let year: i32 = y.parse().ok()?;
                if !KEY_YEARS.contains(&year) {
                    return None;
                }
                let date = NaiveDate::from_ymd_opt(year, m.parse().ok()?, d.parse().ok()?)?;
                Some(PeriodKey::Day(date))
            }
            _ => None,
        }
    }

    pub fn key(&self) -> String {
        match self {
            PeriodKey::Month { year, month } => format!("{:04}-{:02}", year, month),
            PeriodKey::Day(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Display label: "MM.YYYY" for months, "DD.MM.YYYY" for days.
/// Anything else is returned unchanged.
pub fn period_label(key: &str) -> String {
    let parts: Vec<&str> = key.split('-').collect();
    match parts.as_slice() {
        [year, month] => format!("{}.{}", month, year),
        [year, month, day] => format!("{}.{}.{}", day, month, year),
        _ => key.to_string(),
    }
}

/// Bucket a canonical period key for the given granularity.
///
/// Returns `None` when the record falls outside a `Range` (or is month-only
/// and therefore cannot be placed on a daily axis).
pub fn bucket_key(key: &str, granularity: &PeriodGranularity) -> Option<String> {
    match granularity {
        PeriodGranularity::Month => key.get(..7).map(str::to_string),
        PeriodGranularity::Day => Some(key.to_string()),
        PeriodGranularity::Range { from, to } => {
            let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?;
            if date >= *from && date <= *to {
                Some(key.to_string())
            } else {
                None
            }
        }
    }
}

/// Reject a date range that is reversed or wider than [`MAX_RANGE_DAYS`].
pub fn check_range(from: NaiveDate, to: NaiveDate) -> EngineResult<()> {
    let span = to.signed_duration_since(from).num_days();
    if (0..MAX_RANGE_DAYS).contains(&span) {
        Ok(())
    } else {
        Err(EngineError::InvalidRange { from, to })
    }
}

/// Every day of `from..=to` as canonical keys. Empty when `from > to`;
/// stops at the last representable date.
pub fn range_day_keys(from: NaiveDate, to: NaiveDate) -> Vec<String> {
    let mut keys = Vec::new();
    let mut next = Some(from);
    while let Some(day) = next.filter(|day| *day <= to) {
        keys.push(day.format("%Y-%m-%d").to_string());
        next = day.succ_opt();
    }
    keys
}

/// Number of days in a month, `None` for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Day of month if `key` is a day key inside `year`/`month`.
pub fn day_in_month(key: &str, year: i32, month: u32) -> Option<u32> {
    let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?;
    (date.year() == year && date.month() == month).then(|| date.day())
}
