use chrono::{DateTime, Utc};
use contracts::dashboards::d410_sales_overview::{
    FilterKey, IngestSummary, PeriodGranularity, SalesOverview,
};
use contracts::dashboards::d411_sales_heatmap::{HeatmapRequest, HeatmapResponse};
use contracts::projections::p910_sales_facts::{FactKind, FactRecord, ModelInfo, NormalizeReport};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::dashboards::d411_sales_heatmap::service::heatmap_for_records;
use crate::shared::aggregation::comparator::last_period_changes;
use crate::shared::aggregation::ranking::{compute_rankings, model_performance};
use crate::shared::aggregation::rollup::{
    color_aggregates, color_aggregates_parallel, matches_filter, model_aggregates, period_series,
    totals,
};
use crate::shared::cache::{AggregationCache, CacheStats};
use crate::shared::error::EngineResult;
use crate::shared::period::check_range;
use crate::usecases::u601_normalize_batch::{normalize, NormalizedBatch};

/// Default record count from which rollups switch to rayon
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 50_000;

/// One accepted batch. Immutable once built; replaced wholesale on ingest.
#[derive(Debug)]
pub struct Dataset {
    pub batch_id: Uuid,
    pub ingested_at: DateTime<Utc>,
    pub records: Vec<FactRecord>,
    pub models: Vec<ModelInfo>,
    pub report: NormalizeReport,
}

/// Owner of the current dataset and of the aggregation cache built on it.
#[derive(Debug)]
pub struct SalesEngine {
    dataset: Option<Arc<Dataset>>,
    cache: AggregationCache,
    parallel_threshold: usize,
}

impl Default for SalesEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SalesEngine {
    pub fn new() -> Self {
        Self::with_parallel_threshold(DEFAULT_PARALLEL_THRESHOLD)
    }

    pub fn with_parallel_threshold(parallel_threshold: usize) -> Self {
        Self {
            dataset: None,
            cache: AggregationCache::new(),
            parallel_threshold,
        }
    }

    /// Normalize a raw payload and make it the current dataset.
    ///
    /// On error the previous dataset and its cached aggregates stay in place.
    pub fn ingest(&mut self, payload: Value) -> EngineResult<IngestSummary> {
        let batch = normalize(payload)?;
        Ok(self.replace_batch(batch))
    }

    pub fn ingest_json(&mut self, raw: &str) -> EngineResult<IngestSummary> {
        let payload: Value = serde_json::from_str(raw)?;
        self.ingest(payload)
    }

    /// Swap in an already normalized batch and clear the cache.
    pub fn replace_batch(&mut self, batch: NormalizedBatch) -> IngestSummary {
        let dataset = Dataset {
            batch_id: Uuid::new_v4(),
            ingested_at: Utc::now(),
            records: batch.records,
            models: batch.models,
            report: batch.report,
        };

        let summary = IngestSummary {
            batch_id: dataset.batch_id,
            ingested_at: dataset.ingested_at,
            models: dataset.models.len(),
            records: dataset.records.len(),
            report: dataset.report.clone(),
        };

        self.dataset = Some(Arc::new(dataset));
        self.cache.invalidate_all();

        tracing::info!(
            "batch {} ingested: {} models, {} records",
            summary.batch_id,
            summary.models,
            summary.records
        );

        summary
    }

    pub fn has_data(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.clone()
    }

    /// Current records, empty before the first ingest.
    pub fn records(&self) -> &[FactRecord] {
        self.dataset
            .as_ref()
            .map(|d| d.records.as_slice())
            .unwrap_or_default()
    }

    pub fn models(&self) -> &[ModelInfo] {
        self.dataset
            .as_ref()
            .map(|d| d.models.as_slice())
            .unwrap_or_default()
    }

    /// Dashboard view for `filter`, served from the cache when possible.
    /// Before the first ingest every aggregate is zero and every list empty.
    ///
    /// A reversed or overly wide `Range` granularity is rejected.
    pub fn overview(&mut self, filter: &FilterKey) -> EngineResult<Arc<SalesOverview>> {
        if let PeriodGranularity::Range { from, to } = filter.granularity {
            check_range(from, to)?;
        }

        let dataset = self.dataset.clone();
        let threshold = self.parallel_threshold;

        Ok(self.cache.get_or_compute(filter, || match dataset.as_deref() {
            Some(d) => build_overview(&d.records, &d.models, filter, threshold),
            None => build_overview(&[], &[], filter, threshold),
        }))
    }

    pub fn heatmap(&self, request: &HeatmapRequest) -> EngineResult<HeatmapResponse> {
        heatmap_for_records(self.records(), request)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Compute every dashboard aggregate for one filter tuple.
///
/// Rankings, model and color rollups describe contracts; totals, the series
/// and model performance cover all three kinds.
pub fn build_overview(
    records: &[FactRecord],
    models: &[ModelInfo],
    filter: &FilterKey,
    parallel_threshold: usize,
) -> SalesOverview {
    let filtered: Vec<&FactRecord> = records
        .iter()
        .filter(|r| matches_filter(r, filter))
        .collect();
    let contracts: Vec<&FactRecord> = filtered
        .iter()
        .copied()
        .filter(|r| r.kind == FactKind::Contract)
        .collect();

    let period_data = period_series(records, filtered.iter().copied(), &filter.granularity);
    let changes = last_period_changes(&period_data);

    let model_aggregates = model_aggregates(contracts.iter().copied(), models);
    let color_aggregates = if contracts.len() >= parallel_threshold {
        tracing::debug!("parallel color rollup over {} records", contracts.len());
        color_aggregates_parallel(&contracts)
    } else {
        color_aggregates(contracts.iter().copied())
    };
    let rankings = compute_rankings(
        &model_aggregates,
        &color_aggregates,
        contracts.iter().copied(),
    );

    SalesOverview {
        filter: filter.clone(),
        totals: totals(filtered.iter().copied()),
        model_performance: model_performance(filtered.iter().copied()),
        period_data,
        changes,
        model_aggregates,
        color_aggregates,
        rankings,
    }
}
