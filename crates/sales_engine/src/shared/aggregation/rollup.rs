use contracts::dashboards::d410_sales_overview::{FilterKey, PeriodGranularity, PeriodPoint, Totals};
use contracts::dashboards::d411_sales_heatmap::HeatmapMetric;
use contracts::projections::p910_sales_facts::{FactKind, FactRecord, ModelInfo};
use contracts::shared::aggregates::{
    Aggregate, ColorAggregate, ModelAggregate, ModificationAggregate,
};
use rayon::prelude::*;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::shared::period::{self, bucket_key, period_label};

// ---------------------------------------------------------------------------
// Ordered accumulator
// ---------------------------------------------------------------------------

/// Group-by accumulator: hash lookup, entries kept in first-seen key order.
///
/// First-seen order is what ranking tie-breaks rely on, so it must survive
/// merges: keys new to `self` are appended in the other rollup's order.
#[derive(Debug, Clone)]
pub struct Rollup<K> {
    positions: HashMap<K, usize>,
    entries: Vec<(K, Aggregate)>,
}

impl<K> Default for Rollup<K> {
    fn default() -> Self {
        Self {
            positions: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Rollup<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate for `key`, inserting a zero entry on first use.
    pub fn entry(&mut self, key: K) -> &mut Aggregate {
        let pos = match self.positions.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.positions.insert(key.clone(), pos);
                self.entries.push((key, Aggregate::default()));
                pos
            }
        };
        &mut self.entries[pos].1
    }

    pub fn add(&mut self, key: K, count: u64, revenue: f64) {
        self.entry(key).add(count, revenue);
    }

    /// Sum-merge another rollup into this one, key by key.
    pub fn merge(&mut self, other: Rollup<K>) {
        for (key, aggregate) in other.entries {
            self.entry(key).merge(&aggregate);
        }
    }

    pub fn get(&self, key: &K) -> Option<&Aggregate> {
        self.positions.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Aggregate)> {
        self.entries.iter().map(|(k, a)| (k, a))
    }

    pub fn into_entries(self) -> Vec<(K, Aggregate)> {
        self.entries
    }

    pub fn total(&self) -> Aggregate {
        let mut total = Aggregate::default();
        for (_, aggregate) in &self.entries {
            total.merge(aggregate);
        }
        total
    }
}

// ---------------------------------------------------------------------------
// Generic group-by
// ---------------------------------------------------------------------------

/// Single pass group-by over fact records.
pub fn aggregate<'a, K, I, F>(records: I, key_fn: F) -> Rollup<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = &'a FactRecord>,
    F: Fn(&FactRecord) -> K,
{
    let mut rollup = Rollup::new();
    for record in records {
        rollup.add(key_fn(record), record.count, record.revenue);
    }
    rollup
}

/// Partitioned group-by: every rayon split accumulates its own rollup, the
/// partial rollups are then sum-merged in input order. Produces the same
/// keys, values and first-seen order as [`aggregate`].
pub fn aggregate_parallel<R, K, F>(records: &[R], key_fn: F) -> Rollup<K>
where
    R: Borrow<FactRecord> + Sync,
    K: Eq + Hash + Clone + Send,
    F: Fn(&FactRecord) -> K + Sync,
{
    records
        .par_iter()
        .fold(Rollup::new, |mut acc, record| {
            let record = record.borrow();
            acc.add(key_fn(record), record.count, record.revenue);
            acc
        })
        .reduce(Rollup::new, |mut left, right| {
            left.merge(right);
            left
        })
}

/// Groupable dimension of a fact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Model,
    Region,
    Modification,
    Color,
    Period,
}

impl Dimension {
    pub fn value<'r>(&self, record: &'r FactRecord) -> &'r str {
        match self {
            Dimension::Model => &record.model_id,
            Dimension::Region => &record.region_id,
            Dimension::Modification => &record.modification_name,
            Dimension::Color => &record.color_name,
            Dimension::Period => &record.period_key,
        }
    }
}

/// Group by any combination of dimensions; the key holds one value per
/// dimension, in the order given.
pub fn aggregate_by<'a, I>(records: I, dimensions: &[Dimension]) -> Rollup<Vec<String>>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    aggregate(records, |r| {
        dimensions
            .iter()
            .map(|d| d.value(r).to_string())
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Model/region match, plus the date window of a `Range` granularity.
pub fn matches_filter(record: &FactRecord, filter: &FilterKey) -> bool {
    if let Some(model) = &filter.model {
        if &record.model_id != model {
            return false;
        }
    }
    if let Some(region) = &filter.region {
        if &record.region_id != region {
            return false;
        }
    }
    match filter.granularity {
        PeriodGranularity::Range { .. } => {
            bucket_key(&record.period_key, &filter.granularity).is_some()
        }
        PeriodGranularity::Month | PeriodGranularity::Day => true,
    }
}

// ---------------------------------------------------------------------------
// Named rollups
// ---------------------------------------------------------------------------

/// Per color name, summed across all models, in first-seen order.
pub fn color_aggregates<'a, I>(records: I) -> Vec<ColorAggregate>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    aggregate(records, |r| r.color_name.clone())
        .into_entries()
        .into_iter()
        .map(|(name, aggregate)| ColorAggregate { name, aggregate })
        .collect()
}

/// [`color_aggregates`] over rayon; same result, same order.
pub fn color_aggregates_parallel<R>(records: &[R]) -> Vec<ColorAggregate>
where
    R: Borrow<FactRecord> + Sync,
{
    aggregate_parallel(records, |r| r.color_name.clone())
        .into_entries()
        .into_iter()
        .map(|(name, aggregate)| ColorAggregate { name, aggregate })
        .collect()
}

struct ModificationAccumulator {
    name: String,
    aggregate: Aggregate,
    colors: Rollup<String>,
}

struct ModelAccumulator {
    model_id: String,
    model_name: String,
    aggregate: Aggregate,
    modifications: Vec<ModificationAccumulator>,
    positions: HashMap<String, usize>,
}

impl ModelAccumulator {
    fn add(&mut self, record: &FactRecord) {
        self.aggregate.add(record.count, record.revenue);

        let pos = match self.positions.get(&record.modification_name) {
            Some(&pos) => pos,
            None => {
                let pos = self.modifications.len();
                self.positions.insert(record.modification_name.clone(), pos);
                self.modifications.push(ModificationAccumulator {
                    name: record.modification_name.clone(),
                    aggregate: Aggregate::default(),
                    colors: Rollup::new(),
                });
                pos
            }
        };

        let modification = &mut self.modifications[pos];
        modification.aggregate.add(record.count, record.revenue);
        modification
            .colors
            .add(record.color_name.clone(), record.count, record.revenue);
    }

    fn finish(self, photo_ref: Option<String>) -> ModelAggregate {
        ModelAggregate {
            model_id: self.model_id,
            model_name: self.model_name,
            photo_ref,
            total: self.aggregate.count,
            revenue: self.aggregate.revenue,
            avg_price: self.aggregate.avg_price(),
            modifications: self
                .modifications
                .into_iter()
                .map(|m| ModificationAggregate {
                    name: m.name,
                    total: m.aggregate.count,
                    revenue: m.aggregate.revenue,
                    colors: m
                        .colors
                        .into_entries()
                        .into_iter()
                        .map(|(name, aggregate)| ColorAggregate { name, aggregate })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Model → modification → color rollup in one pass, models in first-seen
/// order. `catalog` only supplies display metadata (photo references).
pub fn model_aggregates<'a, I>(records: I, catalog: &[ModelInfo]) -> Vec<ModelAggregate>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    let mut models: Vec<ModelAccumulator> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for record in records {
        let pos = *positions.entry(record.model_id.as_str()).or_insert_with(|| {
            models.push(ModelAccumulator {
                model_id: record.model_id.clone(),
                model_name: record.model_name.clone(),
                aggregate: Aggregate::default(),
                modifications: Vec::new(),
                positions: HashMap::new(),
            });
            models.len() - 1
        });
        models[pos].add(record);
    }

    let photos: HashMap<&str, &Option<String>> = catalog
        .iter()
        .map(|m| (m.id.as_str(), &m.photo_ref))
        .collect();

    models
        .into_iter()
        .map(|m| {
            let photo_ref = photos.get(m.model_id.as_str()).and_then(|p| (*p).clone());
            m.finish(photo_ref)
        })
        .collect()
}

/// Counts per fact kind.
pub fn totals<'a, I>(records: I) -> Totals
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    let mut totals = Totals::default();
    for record in records {
        totals.add(record.kind, record.count);
    }
    totals
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// Chronological series of the `filtered` records.
///
/// The period axis is taken from `axis` (normally the whole, unfiltered
/// batch) so that a filtered view reports an explicit zero for every period
/// the batch knows about. A `Range` granularity additionally zero-fills every
/// day of the range.
pub fn period_series<'a, A, F>(
    axis: A,
    filtered: F,
    granularity: &PeriodGranularity,
) -> Vec<PeriodPoint>
where
    A: IntoIterator<Item = &'a FactRecord>,
    F: IntoIterator<Item = &'a FactRecord>,
{
    let mut points: HashMap<String, Totals> = HashMap::new();

    for record in axis {
        if let Some(key) = bucket_key(&record.period_key, granularity) {
            points.entry(key).or_default();
        }
    }
    if let PeriodGranularity::Range { from, to } = granularity {
        for key in period::range_day_keys(*from, *to) {
            points.entry(key).or_default();
        }
    }

    for record in filtered {
        if let Some(key) = bucket_key(&record.period_key, granularity) {
            points.entry(key).or_default().add(record.kind, record.count);
        }
    }

    let mut series: Vec<PeriodPoint> = points
        .into_iter()
        .map(|(key, t)| PeriodPoint {
            period_label: period_label(&key),
            period_key: key,
            contracts: t.contracts,
            realization: t.realization,
            cancellation: t.cancellation,
        })
        .collect();
    series.sort_by(|a, b| a.period_key.cmp(&b.period_key));
    series
}

/// Day-of-month → metric for one month and one fact kind.
/// Month-only period keys cannot be placed on a day and are ignored.
pub fn daily_totals<'a, I>(
    records: I,
    year: i32,
    month: u32,
    kind: FactKind,
    metric: HeatmapMetric,
) -> HashMap<u32, f64>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    let mut days: HashMap<u32, f64> = HashMap::new();
    for record in records.into_iter().filter(|r| r.kind == kind) {
        if let Some(day) = period::day_in_month(&record.period_key, year, month) {
            let value = match metric {
                HeatmapMetric::Count => record.count as f64,
                HeatmapMetric::Revenue => record.revenue,
            };
            *days.entry(day).or_insert(0.0) += value;
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    fn fact(
        kind: FactKind,
        model: &str,
        region: &str,
        period: &str,
        modification: &str,
        color: &str,
        count: u64,
        revenue: f64,
    ) -> FactRecord {
        FactRecord {
            kind,
            model_id: model.to_lowercase(),
            model_name: model.to_string(),
            region_id: region.to_string(),
            region_name: region.to_uppercase(),
            period_key: period.to_string(),
            modification_name: modification.to_string(),
            color_name: color.to_string(),
            count,
            revenue,
        }
    }

    fn contract(
        model: &str,
        modification: &str,
        color: &str,
        count: u64,
        revenue: f64,
    ) -> FactRecord {
        fact(FactKind::Contract, model, "sp", "2024-03", modification, color, count, revenue)
    }

    #[test]
    fn test_model_aggregates_totals_and_avg_price() {
        let records = vec![
            contract("Onix", "LT", "Red", 10, 100000.0),
            contract("Onix", "LTZ", "Red", 5, 60000.0),
            contract("Tracker", "Premier", "Blue", 20, 150000.0),
        ];

        let models = model_aggregates(&records, &[]);
        assert_eq!(models.len(), 2);

        let onix = &models[0];
        assert_eq!(onix.model_name, "Onix");
        assert_eq!(onix.total, 15);
        assert_eq!(onix.revenue, 160000.0);
        assert!((onix.avg_price - 10666.67).abs() < 0.01);

        let tracker = &models[1];
        assert_eq!(tracker.total, 20);
        assert_eq!(tracker.avg_price, 7500.0);
    }

    #[test]
    fn test_model_aggregates_nest_modifications_and_colors() {
        let records = vec![
            contract("Onix", "LT", "Red", 1, 10.0),
            contract("Onix", "LT", "Blue", 2, 20.0),
            contract("Onix", "LTZ", "Red", 3, 30.0),
            contract("Onix", "LT", "Red", 4, 40.0),
        ];
        let catalog = vec![ModelInfo {
            id: "onix".to_string(),
            name: "Onix".to_string(),
            photo_ref: Some("onix.png".to_string()),
        }];

        let models = model_aggregates(&records, &catalog);
        let onix = &models[0];
        assert_eq!(onix.photo_ref.as_deref(), Some("onix.png"));
        assert_eq!(onix.modifications.len(), 2);

        let lt = onix.modification("LT").unwrap();
        assert_eq!(lt.total, 7);
        assert_eq!(lt.colors.len(), 2);
        assert_eq!(lt.colors[0].name, "Red");
        assert_eq!(lt.color("Red").unwrap().aggregate, Aggregate::new(5, 50.0));
        assert_eq!(onix.modification("LTZ").unwrap().revenue, 30.0);
    }

    #[test]
    fn test_zero_total_model_has_zero_avg_price() {
        let records = vec![contract("Spin", "LT", "Gray", 0, 0.0)];
        let models = model_aggregates(&records, &[]);
        assert_eq!(models[0].total, 0);
        assert_eq!(models[0].avg_price, 0.0);
    }

    #[test]
    fn test_rollup_totals_match_record_sums() {
        let records = vec![
            contract("Onix", "LT", "Red", 3, 300.0),
            contract("Tracker", "LT", "Red", 4, 400.5),
            contract("Spin", "Activ", "White", 8, 800.25),
            contract("Onix", "LTZ", "Black", 1, 100.0),
        ];

        let models = model_aggregates(&records, &[]);
        let total: u64 = models.iter().map(|m| m.total).sum();
        let revenue: f64 = models.iter().map(|m| m.revenue).sum();
        assert_eq!(total, records.iter().map(|r| r.count).sum::<u64>());
        assert!((revenue - records.iter().map(|r| r.revenue).sum::<f64>()).abs() < 1e-9);

        let colors = color_aggregates(&records);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0].name, "Red");
        assert_eq!(colors[0].aggregate.count, 7);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut records = Vec::new();
        for i in 0..5000u64 {
            let color = ["Red", "Blue", "Black", "White", "Gray"][(i % 5) as usize];
            records.push(contract("Onix", "LT", color, i % 7, (i % 11) as f64 * 100.0));
        }

        let sequential = aggregate(&records, |r| r.color_name.clone());
        let parallel = aggregate_parallel(&records, |r| r.color_name.clone());

        let seq: Vec<_> = sequential.iter().map(|(k, a)| (k.clone(), *a)).collect();
        let par: Vec<_> = parallel.iter().map(|(k, a)| (k.clone(), *a)).collect();
        assert_eq!(seq, par);

        let refs: Vec<&FactRecord> = records.iter().collect();
        assert_eq!(color_aggregates_parallel(&refs), color_aggregates(&records));
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let mut left: Rollup<String> = Rollup::new();
        left.add("b".to_string(), 1, 1.0);
        let mut right: Rollup<String> = Rollup::new();
        right.add("a".to_string(), 2, 2.0);
        right.add("b".to_string(), 3, 3.0);

        left.merge(right);
        let keys: Vec<&String> = left.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(left.get(&"b".to_string()), Some(&Aggregate::new(4, 4.0)));
        assert_eq!(left.total(), Aggregate::new(6, 6.0));
    }

    #[test]
    fn test_aggregate_by_dimension_combination() {
        let records = vec![
            fact(FactKind::Contract, "Onix", "sp", "2024-03", "LT", "Red", 1, 1.0),
            fact(FactKind::Contract, "Onix", "rj", "2024-03", "LT", "Red", 2, 2.0),
            fact(FactKind::Contract, "Onix", "sp", "2024-04", "LT", "Blue", 4, 4.0),
        ];

        let by_region_period = aggregate_by(&records, &[Dimension::Region, Dimension::Period]);
        assert_eq!(by_region_period.len(), 3);

        let by_model = aggregate_by(&records, &[Dimension::Model]);
        assert_eq!(
            by_model.get(&vec!["onix".to_string()]),
            Some(&Aggregate::new(7, 7.0))
        );
    }

    #[test]
    fn test_series_zero_fills_periods_of_other_models() {
        let records = vec![
            fact(FactKind::Contract, "Onix", "sp", "2024-01", "LT", "Red", 5, 1.0),
            fact(FactKind::Contract, "Tracker", "sp", "2024-02", "LT", "Red", 7, 1.0),
            fact(FactKind::Realization, "Onix", "sp", "2024-03-15", "LT", "Red", 2, 1.0),
            fact(FactKind::Cancellation, "Onix", "sp", "2024-03-20", "LT", "Red", 1, 1.0),
        ];
        let filter = FilterKey::for_model(PeriodGranularity::Month, "onix");

        let series = period_series(
            &records,
            records.iter().filter(|r| matches_filter(r, &filter)),
            &filter.granularity,
        );

        let keys: Vec<&str> = series.iter().map(|p| p.period_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(series[0].contracts, 5);
        assert_eq!(series[1].contracts, 0);
        assert_eq!(series[1].period_label, "02.2024");
        assert_eq!(series[2].realization, 2);
        assert_eq!(series[2].cancellation, 1);
    }

    #[test]
    fn test_series_range_fills_every_day() {
        let from = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to = chrono::NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let granularity = PeriodGranularity::Range { from, to };
        let records = vec![
            fact(FactKind::Contract, "Onix", "sp", "2024-03-02", "LT", "Red", 5, 1.0),
            fact(FactKind::Contract, "Onix", "sp", "2024-03-09", "LT", "Red", 9, 1.0),
        ];

        let series = period_series(&records, &records, &granularity);
        let keys: Vec<&str> = series.iter().map(|p| p.period_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);
        assert_eq!(series[1].contracts, 5);
        assert_eq!(series[0].period_label, "01.03.2024");
    }

    #[test]
    fn test_empty_input_yields_empty_outputs() {
        let records: Vec<FactRecord> = Vec::new();
        assert!(model_aggregates(&records, &[]).is_empty());
        assert!(color_aggregates(&records).is_empty());
        assert_eq!(totals(&records), Totals::default());
        assert!(period_series(&records, &records, &PeriodGranularity::Month).is_empty());
    }

    #[test]
    fn test_daily_totals() {
        let records = vec![
            fact(FactKind::Contract, "Onix", "sp", "2024-03-02", "LT", "Red", 5, 50.0),
            fact(FactKind::Contract, "Tracker", "rj", "2024-03-02", "LT", "Red", 6, 60.0),
            fact(FactKind::Contract, "Onix", "sp", "2024-04-02", "LT", "Red", 9, 90.0),
            fact(FactKind::Contract, "Onix", "sp", "2024-03", "LT", "Red", 9, 90.0),
            fact(FactKind::Realization, "Onix", "sp", "2024-03-02", "LT", "Red", 1, 10.0),
        ];

        let counts = daily_totals(&records, 2024, 3, FactKind::Contract, HeatmapMetric::Count);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&2], 11.0);

        let revenue = daily_totals(&records, 2024, 3, FactKind::Contract, HeatmapMetric::Revenue);
        assert_eq!(revenue[&2], 110.0);
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let records = vec![
            contract("Onix", "LT", "Red", u64::MAX - 1, 1.0),
            contract("Onix", "LT", "Red", 10, 1.0),
        ];

        assert_eq!(totals(&records).contracts, u64::MAX);
        assert_eq!(model_aggregates(&records, &[])[0].total, u64::MAX);
        let series = period_series(&records, &records, &PeriodGranularity::Month);
        assert_eq!(series[0].contracts, u64::MAX);
        let parallel = aggregate_parallel(&records, |r| r.color_name.clone());
        assert_eq!(parallel.total().count, u64::MAX);
    }
}
