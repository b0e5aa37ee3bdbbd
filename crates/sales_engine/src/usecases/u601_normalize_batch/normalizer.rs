use contracts::domain::a030_vehicle_model::{RawEntry, RawModel, RawPeriod, RawRegion};
use contracts::projections::p910_sales_facts::{
    FactIdentity, FactKind, FactRecord, ModelInfo, NormalizeReport,
};
use contracts::shared::lenient::{LenientList, LenientNumber};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::shared::error::{EngineError, EngineResult};
use crate::shared::period::PeriodKey;

/// Flat, canonical view of one raw batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// In first-seen (ingestion) order, duplicates already summed
    pub records: Vec<FactRecord>,
    /// Display catalogue in payload order
    pub models: Vec<ModelInfo>,
    pub report: NormalizeReport,
}

/// Parse a JSON document and normalize it.
pub fn normalize_json(raw: &str) -> EngineResult<NormalizedBatch> {
    let payload: Value = serde_json::from_str(raw)?;
    normalize(payload)
}

/// Flatten a payload (a JSON array of models) into fact records.
///
/// The only failure is a payload that is not an array at all; everything
/// below the top level is recovered element by element.
pub fn normalize(payload: Value) -> EngineResult<NormalizedBatch> {
    let elements = match payload {
        Value::Array(elements) => elements,
        other => return Err(EngineError::NotAModelList(json_type_name(&other))),
    };

    let mut builder = BatchBuilder::default();

    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value::<RawModel>(element) {
            Ok(raw) => builder.push_model(index, &raw),
            Err(e) => {
                tracing::warn!("model #{index} skipped: {e}");
                builder.report.skipped_elements += 1;
            }
        }
    }

    let batch = builder.finish();

    tracing::info!(
        "normalized batch: {} models, {} records, report: {:?}",
        batch.models.len(),
        batch.records.len(),
        batch.report
    );

    Ok(batch)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BatchBuilder {
    records: Vec<FactRecord>,
    positions: HashMap<FactIdentity, usize>,
    models: Vec<ModelInfo>,
    seen_models: HashSet<String>,
    report: NormalizeReport,
}

/// Identity of the model/region branch currently being flattened.
struct Scope<'a> {
    kind: FactKind,
    model_id: &'a str,
    model_name: &'a str,
}

impl BatchBuilder {
    fn push_model(&mut self, index: usize, raw: &RawModel) {
        // A model without an id falls back to its name
        let Some(model_id) = raw.id.as_deref().or(raw.name.as_deref()) else {
            tracing::warn!("model #{index} skipped: neither id nor name");
            self.report.skipped_elements += 1;
            return;
        };
        let model_name = raw.name.to_owned_or(model_id);

        if self.seen_models.insert(model_id.to_string()) {
            self.models.push(ModelInfo {
                id: model_id.to_string(),
                name: model_name.clone(),
                photo_ref: raw.photo_ref.as_deref().map(str::to_string),
            });
        }

        let branches = [
            (FactKind::Contract, &raw.by_period),
            (FactKind::Realization, &raw.by_realized),
            (FactKind::Cancellation, &raw.by_cancelled),
        ];

        for (kind, periods) in branches {
            self.note_list(periods);
            let scope = Scope {
                kind,
                model_id,
                model_name: &model_name,
            };
            for period in periods.iter() {
                self.push_period(&scope, period);
            }
        }
    }

    fn push_period(&mut self, scope: &Scope<'_>, period: &RawPeriod) {
        let Some(period_key) = period.period.as_deref().and_then(PeriodKey::parse) else {
            tracing::warn!(
                "model {}: {} period {:?} skipped: not a YYYY-MM[-DD] key",
                scope.model_id,
                scope.kind.as_str(),
                period.period.0
            );
            self.report.skipped_elements += 1;
            return;
        };
        let period_key = period_key.key();

        self.note_list(&period.regions);
        for region in period.regions.iter() {
            self.push_region(scope, &period_key, region);
        }
    }

    fn push_region(&mut self, scope: &Scope<'_>, period_key: &str, region: &RawRegion) {
        let Some(region_id) = region.region_id.as_deref().or(region.region_name.as_deref()) else {
            tracing::warn!(
                "model {} period {}: region without id or name skipped",
                scope.model_id,
                period_key
            );
            self.report.skipped_elements += 1;
            return;
        };
        let region_name = region.region_name.to_owned_or(region_id);

        self.note_list(&region.entries);
        for entry in region.entries.iter() {
            let record = FactRecord {
                kind: scope.kind,
                model_id: scope.model_id.to_string(),
                model_name: scope.model_name.to_string(),
                region_id: region_id.to_string(),
                region_name: region_name.clone(),
                period_key: period_key.to_string(),
                modification_name: entry.modification.to_owned_or(""),
                color_name: entry.color.to_owned_or(""),
                count: self.count_of(entry),
                revenue: self.amount_of(entry),
            };
            self.push_record(record);
        }
    }

    fn count_of(&mut self, entry: &RawEntry) -> u64 {
        self.note_number(&entry.count);
        entry.count.as_count()
    }

    fn amount_of(&mut self, entry: &RawEntry) -> f64 {
        self.note_number(&entry.amount);
        entry.amount.as_amount()
    }

    fn note_number(&mut self, number: &LenientNumber) {
        if number.is_recovered() {
            self.report.parse_errors += 1;
        } else if number.is_negative() {
            self.report.clamped_negatives += 1;
        }
    }

    fn note_list<T>(&mut self, list: &LenientList<T>) {
        if !list.present {
            self.report.missing_branches += 1;
        }
        self.report.skipped_elements += list.skipped;
    }

    /// Same identity within a batch: sum, keep the first position.
    fn push_record(&mut self, record: FactRecord) {
        let identity = record.identity();
        match self.positions.get(&identity) {
            Some(&pos) => {
                let existing = &mut self.records[pos];
                existing.count = existing.count.saturating_add(record.count);
                existing.revenue += record.revenue;
                self.report.merged_duplicates += 1;
            }
            None => {
                self.positions.insert(identity, self.records.len());
                self.records.push(record);
            }
        }
    }

    fn finish(self) -> NormalizedBatch {
        NormalizedBatch {
            records: self.records,
            models: self.models,
            report: self.report,
        }
    }
}
