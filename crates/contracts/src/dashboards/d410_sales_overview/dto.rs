use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::projections::p910_sales_facts::{FactKind, NormalizeReport};
use crate::shared::aggregates::{ColorAggregate, ModelAggregate, RankingResult};

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Time bucket used for series and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PeriodGranularity {
    /// "YYYY-MM" buckets
    #[default]
    Month,
    /// "YYYY-MM-DD" buckets; month-only periods stay monthly
    Day,
    /// Daily buckets limited to `from..=to`, every day present
    Range { from: NaiveDate, to: NaiveDate },
}

/// Inclusive date window requested from the upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }
}

/// Active filter tuple; also the aggregation cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterKey {
    /// Model id, `None` for all models
    pub model: Option<String>,
    /// Region id, `None` for all regions
    pub region: Option<String>,
    pub granularity: PeriodGranularity,
}

impl FilterKey {
    /// All models, all regions
    pub fn all(granularity: PeriodGranularity) -> Self {
        Self {
            model: None,
            region: None,
            granularity,
        }
    }

    pub fn for_model(granularity: PeriodGranularity, model_id: &str) -> Self {
        let mut filter = Self::all(granularity);
        filter.model = Some(model_id.to_string());
        filter
    }

    pub fn for_region(granularity: PeriodGranularity, region_id: &str) -> Self {
        let mut filter = Self::all(granularity);
        filter.region = Some(region_id.to_string());
        filter
    }

    pub fn for_model_and_region(
        granularity: PeriodGranularity,
        model_id: &str,
        region_id: &str,
    ) -> Self {
        let mut filter = Self::all(granularity);
        filter.model = Some(model_id.to_string());
        filter.region = Some(region_id.to_string());
        filter
    }
}

// ---------------------------------------------------------------------------
// Series and totals
// ---------------------------------------------------------------------------

/// One entry of the chronological series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPoint {
    /// Ordering key, "YYYY-MM" or "YYYY-MM-DD"
    pub period_key: String,
    /// "MM.YYYY" or "DD.MM.YYYY"
    pub period_label: String,
    pub contracts: u64,
    pub realization: u64,
    pub cancellation: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub contracts: u64,
    pub realization: u64,
    pub cancellation: u64,
}

impl Totals {
    /// Add `count` to the counter of `kind`, saturating at `u64::MAX`.
    pub fn add(&mut self, kind: FactKind, count: u64) {
        let counter = match kind {
            FactKind::Contract => &mut self.contracts,
            FactKind::Realization => &mut self.realization,
            FactKind::Cancellation => &mut self.cancellation,
        };
        *counter = counter.saturating_add(count);
    }
}

/// Current vs previous value.
///
/// `percent` is rounded to one decimal and is `0` whenever `previous == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsChanges {
    pub contracts: Change,
    pub realization: Change,
    pub cancellation: Change,
}

/// Series point compared with the point at the same position of another series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodChange {
    pub period_key: String,
    pub period_label: String,
    pub contracts: Change,
    pub realization: Change,
    pub cancellation: Change,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPerformance {
    pub model_id: String,
    pub model_name: String,
    pub contracts: u64,
    pub realization: u64,
    pub cancellation: u64,
    /// round(realization / contracts * 100), 0 without contracts
    pub conversion: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    pub best_selling_model: Option<RankingResult>,
    pub most_profitable_model: Option<RankingResult>,
    pub best_selling_color: Option<RankingResult>,
    pub best_combination: Option<RankingResult>,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Everything the overview dashboard shows for one filter tuple.
/// This is the value stored in the aggregation cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOverview {
    pub filter: FilterKey,
    pub period_data: Vec<PeriodPoint>,
    pub totals: Totals,
    /// Last period of the series vs the one before it
    pub changes: TotalsChanges,
    pub model_performance: Vec<ModelPerformance>,
    pub model_aggregates: Vec<ModelAggregate>,
    pub color_aggregates: Vec<ColorAggregate>,
    pub rankings: Rankings,
}

/// Result of accepting one raw batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub batch_id: Uuid,
    pub ingested_at: DateTime<Utc>,
    pub models: usize,
    pub records: usize,
    pub report: NormalizeReport,
}
