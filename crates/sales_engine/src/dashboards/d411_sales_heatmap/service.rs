use chrono::{Datelike, NaiveDate};
use contracts::dashboards::d411_sales_heatmap::{
    HeatmapBucket, HeatmapCell, HeatmapRequest, HeatmapResponse,
};
use contracts::projections::p910_sales_facts::FactRecord;
use std::collections::HashMap;

use crate::shared::aggregation::rollup::daily_totals;
use crate::shared::error::{EngineError, EngineResult};
use crate::shared::period::days_in_month;

// Absolute bucket thresholds. No documented derivation upstream; kept as
// literals until someone decides on a configurable scheme.
pub const LOW_BELOW: f64 = 1000.0;
pub const MEDIUM_BELOW: f64 = 1200.0;
pub const HIGH_BELOW: f64 = 1500.0;

/// Bucket of a past (or today's) value; `0` means no activity.
pub fn bucket_for(value: f64) -> HeatmapBucket {
    if value <= 0.0 {
        HeatmapBucket::None
    } else if value < LOW_BELOW {
        HeatmapBucket::Low
    } else if value < MEDIUM_BELOW {
        HeatmapBucket::Medium
    } else if value < HIGH_BELOW {
        HeatmapBucket::High
    } else {
        HeatmapBucket::VeryHigh
    }
}

/// Week-major grid (Monday first, 7 cells per row) for one month.
///
/// * cells before the 1st and after the last day are padding
/// * days after `today` are `is_future` with no value and no bucket,
///   even if `values` has an entry for them
/// * other days without an entry count as `0`
pub fn build_heatmap(
    year: i32,
    month: u32,
    values: &HashMap<u32, f64>,
    today: NaiveDate,
) -> EngineResult<Vec<Vec<HeatmapCell>>> {
    let invalid = || EngineError::InvalidMonth { year, month };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let days = days_in_month(year, month).ok_or_else(invalid)?;

    let leading = first.weekday().num_days_from_monday() as usize;
    let mut cells: Vec<HeatmapCell> = Vec::with_capacity(42);
    cells.extend(std::iter::repeat_with(HeatmapCell::padding).take(leading));

    for day in 1..=days {
        let date = first.with_day(day).ok_or_else(invalid)?;
        let cell = if date > today {
            HeatmapCell {
                day: Some(day),
                value: None,
                bucket: HeatmapBucket::None,
                is_future: true,
            }
        } else {
            let value = values.get(&day).copied().unwrap_or(0.0);
            HeatmapCell {
                day: Some(day),
                value: Some(value),
                bucket: bucket_for(value),
                is_future: false,
            }
        };
        cells.push(cell);
    }

    while cells.len() % 7 != 0 {
        cells.push(HeatmapCell::padding());
    }

    Ok(cells.chunks(7).map(<[HeatmapCell]>::to_vec).collect())
}

/// Heatmap of one month of the given records, narrowed by the request's
/// model/region.
pub fn heatmap_for_records(
    records: &[FactRecord],
    request: &HeatmapRequest,
) -> EngineResult<HeatmapResponse> {
    let selected = records.iter().filter(|r| {
        request.model.as_ref().map_or(true, |m| &r.model_id == m)
            && request.region.as_ref().map_or(true, |g| &r.region_id == g)
    });

    let values = daily_totals(
        selected,
        request.year,
        request.month,
        request.kind,
        request.metric,
    );
    let weeks = build_heatmap(request.year, request.month, &values, request.today)?;

    Ok(HeatmapResponse {
        period: format!("{:04}-{:02}", request.year, request.month),
        weeks,
    })
}
