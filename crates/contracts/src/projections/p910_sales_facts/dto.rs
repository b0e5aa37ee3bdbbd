use serde::{Deserialize, Serialize};

/// Which payload branch a fact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FactKind {
    /// `byPeriod`: signed contracts
    Contract,
    /// `byRealized`
    Realization,
    /// `byCancelled`
    Cancellation,
}

impl FactKind {
    pub const ALL: [FactKind; 3] = [
        FactKind::Contract,
        FactKind::Realization,
        FactKind::Cancellation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactKind::Contract => "contract",
            FactKind::Realization => "realization",
            FactKind::Cancellation => "cancellation",
        }
    }
}

/// One atomic observation: model × region × period × modification × color.
///
/// `count` and `revenue` are never negative. Records are immutable once a
/// batch has been normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRecord {
    pub kind: FactKind,
    pub model_id: String,
    pub model_name: String,
    pub region_id: String,
    pub region_name: String,
    /// Canonical "YYYY-MM" or "YYYY-MM-DD"
    pub period_key: String,
    pub modification_name: String,
    pub color_name: String,
    pub count: u64,
    pub revenue: f64,
}

/// Identity of a duplicate-summing group within one batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactIdentity {
    pub kind: FactKind,
    pub model_id: String,
    pub region_id: String,
    pub period_key: String,
    pub modification_name: String,
    pub color_name: String,
}

impl FactRecord {
    pub fn identity(&self) -> FactIdentity {
        FactIdentity {
            kind: self.kind,
            model_id: self.model_id.clone(),
            region_id: self.region_id.clone(),
            period_key: self.period_key.clone(),
            modification_name: self.modification_name.clone(),
            color_name: self.color_name.clone(),
        }
    }
}

/// Display metadata of a model; plays no role in aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub photo_ref: Option<String>,
}

/// What the normalizer had to recover from while flattening one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    /// Count/amount fields that were missing or unparseable (defaulted to 0)
    pub parse_errors: usize,
    /// Negative counts/amounts floored to 0
    pub clamped_negatives: usize,
    /// Nested branches that were absent or not arrays
    pub missing_branches: usize,
    /// Array elements that were not objects, or lacked a usable key
    pub skipped_elements: usize,
    /// Entries folded into an earlier record with the same identity
    pub merged_duplicates: usize,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool {
        self.parse_errors == 0
            && self.clamped_negatives == 0
            && self.missing_branches == 0
            && self.skipped_elements == 0
    }
}
