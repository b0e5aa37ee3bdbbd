use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::projections::p910_sales_facts::FactKind;

/// Discrete color category of a heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatmapBucket {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    /// Day of month, `None` for padding cells outside the month
    pub day: Option<u32>,
    pub value: Option<f64>,
    pub bucket: HeatmapBucket,
    pub is_future: bool,
}

impl HeatmapCell {
    /// Padding cell before the 1st or after the last day of the month.
    pub fn padding() -> Self {
        Self {
            day: None,
            value: None,
            bucket: HeatmapBucket::None,
            is_future: false,
        }
    }
}

/// Which number of the daily rollup feeds the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatmapMetric {
    #[default]
    Count,
    Revenue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapRequest {
    pub year: i32,
    pub month: u32,
    pub kind: FactKind,
    #[serde(default)]
    pub metric: HeatmapMetric,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapResponse {
    /// "YYYY-MM"
    pub period: String,
    /// Week rows, Monday first, always 7 cells each
    pub weeks: Vec<Vec<HeatmapCell>>,
}
