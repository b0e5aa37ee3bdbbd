use chrono::{Datelike, Duration, Local};
use contracts::dashboards::d410_sales_overview::{DateRange, FilterKey};
use contracts::dashboards::d411_sales_heatmap::{HeatmapMetric, HeatmapRequest};
use contracts::projections::p910_sales_facts::FactKind;
use std::path::PathBuf;

use sales_engine::shared::{config, logger};
use sales_engine::{DashboardService, FileBatchSource, RefreshOutcome, SalesEngine};

/// Days of history requested on startup
const DEFAULT_LOOKBACK_DAYS: i64 = 365;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;
    logger::init(&config::resolve_path(&config.logging.file))?;

    // First CLI argument overrides the configured payload
    let payload_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config::resolve_path(&config.source.payload_path));

    tracing::info!("payload: {}", payload_path.display());

    let service = DashboardService::new(
        FileBatchSource::new(payload_path),
        SalesEngine::with_parallel_threshold(config.engine.parallel_threshold),
    );

    let today = Local::now().date_naive();
    let range = DateRange::new(today - Duration::days(DEFAULT_LOOKBACK_DAYS), today);

    match service.refresh(range).await? {
        RefreshOutcome::Applied(summary) => {
            if !summary.report.is_clean() {
                tracing::warn!("batch {} recovered from: {:?}", summary.batch_id, summary.report);
            }
        }
        RefreshOutcome::FetchFailed { reason } => {
            tracing::warn!("no data available yet: {}", reason);
        }
        RefreshOutcome::Discarded { .. } => {}
    }

    let overview = service.overview(&FilterKey::all(config.engine.granularity.into()))?;
    let heatmap = service.heatmap(&HeatmapRequest {
        year: today.year(),
        month: today.month(),
        kind: FactKind::Contract,
        metric: HeatmapMetric::Count,
        model: None,
        region: None,
        today,
    })?;

    let output = serde_json::json!({
        "overview": &*overview,
        "heatmap": heatmap,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
