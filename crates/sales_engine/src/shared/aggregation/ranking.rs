//! Argmax rankings and derived ratios.
//!
//! Tie-break rule: candidates are visited in first-seen (ingestion) order and
//! a later candidate only replaces the current leader when it is strictly
//! greater. On a tie, the earliest candidate wins.

use contracts::dashboards::d410_sales_overview::{ModelPerformance, Rankings};
use contracts::projections::p910_sales_facts::{FactKind, FactRecord};
use contracts::shared::aggregates::{
    ColorAggregate, ModelAggregate, RankingKey, RankingResult,
};
use std::collections::HashMap;

use super::rollup::aggregate;

/// First maximum of `metric` over `items`, `None` for an empty input.
pub fn argmax_by<T, M, I, F>(items: I, metric: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    M: PartialOrd,
    F: Fn(&T) -> M,
{
    let mut best: Option<(T, M)> = None;
    for item in items {
        let value = metric(&item);
        let replace = match &best {
            None => true,
            Some((_, leader)) => value > *leader,
        };
        if replace {
            best = Some((item, value));
        }
    }
    best.map(|(item, _)| item)
}

fn model_result(model: &ModelAggregate) -> RankingResult {
    RankingResult {
        key: RankingKey::Model {
            id: model.model_id.clone(),
            name: model.model_name.clone(),
        },
        aggregate: model.aggregate(),
    }
}

/// Highest `total`.
pub fn best_selling_model(models: &[ModelAggregate]) -> Option<RankingResult> {
    argmax_by(models, |m| m.total).map(model_result)
}

/// Highest `revenue`.
pub fn most_profitable_model(models: &[ModelAggregate]) -> Option<RankingResult> {
    argmax_by(models, |m| m.revenue).map(model_result)
}

/// Highest summed `count` of a color across all models.
pub fn best_selling_color(colors: &[ColorAggregate]) -> Option<RankingResult> {
    argmax_by(colors, |c| c.aggregate.count).map(|c| RankingResult {
        key: RankingKey::Color {
            name: c.name.clone(),
        },
        aggregate: c.aggregate,
    })
}

/// Highest `count` over the flattened (model, modification, color) triple.
pub fn best_combination<'a, I>(records: I) -> Option<RankingResult>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    let triples = aggregate(records, |r| {
        (
            r.model_id.clone(),
            r.model_name.clone(),
            r.modification_name.clone(),
            r.color_name.clone(),
        )
    });

    argmax_by(triples.into_entries(), |entry| entry.1.count).map(
        |((model_id, model_name, modification, color), aggregate)| RankingResult {
            key: RankingKey::Combination {
                model_id,
                model_name,
                modification,
                color,
            },
            aggregate,
        },
    )
}

/// `round(realization / contracts * 100)`, `0` when there are no contracts.
pub fn conversion_percent(realization: u64, contracts: u64) -> u32 {
    if contracts == 0 {
        return 0;
    }
    (realization as f64 / contracts as f64 * 100.0).round() as u32
}

/// Contracts / realization / cancellation counts and conversion per model,
/// models in first-seen order.
pub fn model_performance<'a, I>(records: I) -> Vec<ModelPerformance>
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    let mut rows: Vec<ModelPerformance> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for record in records {
        let pos = *positions.entry(record.model_id.as_str()).or_insert_with(|| {
            rows.push(ModelPerformance {
                model_id: record.model_id.clone(),
                model_name: record.model_name.clone(),
                contracts: 0,
                realization: 0,
                cancellation: 0,
                conversion: 0,
            });
            rows.len() - 1
        });

        let row = &mut rows[pos];
        let counter = match record.kind {
            FactKind::Contract => &mut row.contracts,
            FactKind::Realization => &mut row.realization,
            FactKind::Cancellation => &mut row.cancellation,
        };
        *counter = counter.saturating_add(record.count);
    }

    for row in &mut rows {
        row.conversion = conversion_percent(row.realization, row.contracts);
    }
    rows
}

/// All four winners. `models`/`colors` and `contract_records` must describe
/// the same (contract) record set.
pub fn compute_rankings<'a, I>(
    models: &[ModelAggregate],
    colors: &[ColorAggregate],
    contract_records: I,
) -> Rankings
where
    I: IntoIterator<Item = &'a FactRecord>,
{
    Rankings {
        best_selling_model: best_selling_model(models),
        most_profitable_model: most_profitable_model(models),
        best_selling_color: best_selling_color(colors),
        best_combination: best_combination(contract_records),
    }
}
