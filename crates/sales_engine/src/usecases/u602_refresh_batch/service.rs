use contracts::dashboards::d410_sales_overview::{
    DateRange, FilterKey, IngestSummary, SalesOverview,
};
use contracts::dashboards::d411_sales_heatmap::{HeatmapRequest, HeatmapResponse};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::guard::RequestGuard;
use super::source::BatchSource;
use crate::dashboards::d410_sales_overview::SalesEngine;
use crate::shared::error::EngineResult;
use crate::shared::period::check_range;
use crate::usecases::u601_normalize_batch::normalize;

/// What happened to one refresh request.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The fetched batch replaced the current dataset
    Applied(IngestSummary),
    /// A newer request was issued while this one was in flight
    Discarded { ticket: u64, latest: u64 },
    /// No new batch; the previous dataset (if any) is still served
    FetchFailed { reason: String },
}

/// Async front of the engine: fetches batches, drops stale responses and
/// serves dashboard views from the shared engine.
pub struct DashboardService<S> {
    source: S,
    engine: Arc<RwLock<SalesEngine>>,
    guard: RequestGuard,
}

impl<S: BatchSource> DashboardService<S> {
    pub fn new(source: S, engine: SalesEngine) -> Self {
        Self {
            source,
            engine: Arc::new(RwLock::new(engine)),
            guard: RequestGuard::new(),
        }
    }

    pub fn engine(&self) -> Arc<RwLock<SalesEngine>> {
        Arc::clone(&self.engine)
    }

    /// Fetch a batch for `range` and make it current unless a newer refresh
    /// started in the meantime.
    ///
    /// Only a payload that is not a model list is an error; fetch failures
    /// are reported as [`RefreshOutcome::FetchFailed`].
    pub async fn refresh(&self, range: DateRange) -> EngineResult<RefreshOutcome> {
        check_range(range.from, range.to)?;

        let ticket = self.guard.issue();
        tracing::info!(
            "refresh #{} started for {}..{}",
            ticket.value(),
            range.from,
            range.to
        );

        let fetched = self.source.fetch(&range).await;

        if !self.guard.is_current(ticket) {
            return Ok(self.discard(ticket.value()));
        }

        let payload = match fetched {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("refresh #{} fetch failed: {:#}", ticket.value(), e);
                return Ok(RefreshOutcome::FetchFailed {
                    reason: format!("{:#}", e),
                });
            }
        };

        let batch = normalize(payload)?;

        let mut engine = self.write_engine();
        // a newer refresh may have started while normalizing
        if !self.guard.is_current(ticket) {
            return Ok(self.discard(ticket.value()));
        }

        Ok(RefreshOutcome::Applied(engine.replace_batch(batch)))
    }

    pub fn overview(&self, filter: &FilterKey) -> EngineResult<Arc<SalesOverview>> {
        self.write_engine().overview(filter)
    }

    pub fn heatmap(&self, request: &HeatmapRequest) -> EngineResult<HeatmapResponse> {
        self.read_engine().heatmap(request)
    }

    fn discard(&self, ticket: u64) -> RefreshOutcome {
        let latest = self.guard.latest();
        tracing::info!("refresh #{} discarded, #{} is newer", ticket, latest);
        RefreshOutcome::Discarded { ticket, latest }
    }

    fn read_engine(&self) -> RwLockReadGuard<'_, SalesEngine> {
        self.engine.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_engine(&self) -> RwLockWriteGuard<'_, SalesEngine> {
        self.engine.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::EngineError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Each fetch waits for the next scripted response.
    struct ScriptedSource {
        pending: Mutex<VecDeque<oneshot::Receiver<anyhow::Result<Value>>>>,
    }

    impl ScriptedSource {
        fn new(receivers: Vec<oneshot::Receiver<anyhow::Result<Value>>>) -> Self {
            Self {
                pending: Mutex::new(receivers.into()),
            }
        }
    }

    #[async_trait]
    impl BatchSource for ScriptedSource {
        async fn fetch(&self, _range: &DateRange) -> anyhow::Result<Value> {
            let receiver = self.pending.lock().unwrap().pop_front();
            match receiver {
                Some(rx) => rx.await?,
                None => anyhow::bail!("no scripted response left"),
            }
        }
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    fn payload(model: &str, count: u64) -> Value {
        json!([{
            "id": model,
            "name": model,
            "byPeriod": [{
                "period": "2024-03",
                "regions": [{
                    "regionId": "sp",
                    "regionName": "São Paulo",
                    "entries": [{"modification": "LT", "color": "Red", "count": count, "amount": 1000}]
                }]
            }]
        }])
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (old_tx, old_rx) = oneshot::channel();
        let (new_tx, new_rx) = oneshot::channel();
        let service = DashboardService::new(
            ScriptedSource::new(vec![old_rx, new_rx]),
            SalesEngine::new(),
        );

        let (old, new, _) = tokio::join!(service.refresh(range()), service.refresh(range()), async {
            // newest answers first, the old one arrives late
            new_tx.send(Ok(payload("tracker", 20))).unwrap();
            tokio::task::yield_now().await;
            old_tx.send(Ok(payload("onix", 10))).unwrap();
        });

        assert_eq!(
            old.unwrap(),
            RefreshOutcome::Discarded {
                ticket: 1,
                latest: 2
            }
        );
        assert!(matches!(new.unwrap(), RefreshOutcome::Applied(_)));

        let overview = service.overview(&FilterKey::default()).unwrap();
        assert_eq!(overview.model_aggregates.len(), 1);
        assert_eq!(overview.model_aggregates[0].model_id, "tracker");
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_last_dataset() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        first_tx.send(Ok(payload("onix", 10))).unwrap();
        second_tx.send(Err(anyhow::anyhow!("upstream timeout"))).unwrap();

        let service = DashboardService::new(
            ScriptedSource::new(vec![first_rx, second_rx]),
            SalesEngine::new(),
        );

        let applied = service.refresh(range()).await.unwrap();
        assert!(matches!(applied, RefreshOutcome::Applied(ref s) if s.records == 1));
        let before = service.overview(&FilterKey::default()).unwrap();

        let failed = service.refresh(range()).await.unwrap();
        assert_eq!(
            failed,
            RefreshOutcome::FetchFailed {
                reason: "upstream timeout".to_string()
            }
        );

        let after = service.overview(&FilterKey::default()).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.totals.contracts, 10);
    }

    #[tokio::test]
    async fn test_fetch_failure_before_any_data_serves_zeroes() {
        let service = DashboardService::new(ScriptedSource::new(vec![]), SalesEngine::new());

        let outcome = service.refresh(range()).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::FetchFailed { .. }));
        let overview = service.overview(&FilterKey::default()).unwrap();
        assert_eq!(overview.totals.contracts, 0);
    }

    #[tokio::test]
    async fn test_invalid_payload_and_range_are_errors() {
        let (tx, rx) = oneshot::channel();
        tx.send(Ok(json!({"models": []}))).unwrap();
        let service = DashboardService::new(ScriptedSource::new(vec![rx]), SalesEngine::new());

        let err = service.refresh(range()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotAModelList("object")));

        let backwards = DateRange::new(range().to, range().from);
        let err = service.refresh(backwards).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { .. }));

        let unbounded = DateRange::new(NaiveDate::MIN, NaiveDate::MAX);
        let err = service.refresh(unbounded).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { .. }));
        assert!(!service.engine().read().unwrap().has_data());
    }
}
