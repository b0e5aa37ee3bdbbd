use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

// ---------------------------------------------------------------------------
// Atomic accumulation unit
// ---------------------------------------------------------------------------

/// `{count, revenue}` accumulated over a set of fact records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub count: u64,
    pub revenue: f64,
}

impl Aggregate {
    pub fn new(count: u64, revenue: f64) -> Self {
        Self { count, revenue }
    }

    /// Counts saturate at `u64::MAX` instead of wrapping.
    pub fn add(&mut self, count: u64, revenue: f64) {
        self.count = self.count.saturating_add(count);
        self.revenue += revenue;
    }

    pub fn merge(&mut self, other: &Aggregate) {
        self.add(other.count, other.revenue);
    }

    /// `revenue / count`, or `0` for an empty aggregate.
    pub fn avg_price(&self) -> f64 {
        if self.count > 0 {
            self.revenue / self.count as f64
        } else {
            0.0
        }
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0 && self.revenue == 0.0
    }
}

impl AddAssign for Aggregate {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

// ---------------------------------------------------------------------------
// Per-model rollup
// ---------------------------------------------------------------------------

/// Aggregate of one color inside a modification, or across all models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorAggregate {
    pub name: String,
    #[serde(flatten)]
    pub aggregate: Aggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationAggregate {
    pub name: String,
    pub total: u64,
    pub revenue: f64,
    /// In first-seen order
    pub colors: Vec<ColorAggregate>,
}

/// Model → modification → color rollup.
///
/// `avg_price` is `revenue / total`, or `0` when `total == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAggregate {
    pub model_id: String,
    pub model_name: String,
    pub photo_ref: Option<String>,
    pub total: u64,
    pub revenue: f64,
    pub avg_price: f64,
    /// In first-seen order
    pub modifications: Vec<ModificationAggregate>,
}

impl ModelAggregate {
    pub fn aggregate(&self) -> Aggregate {
        Aggregate::new(self.total, self.revenue)
    }

    pub fn modification(&self, name: &str) -> Option<&ModificationAggregate> {
        self.modifications.iter().find(|m| m.name == name)
    }
}

impl ModificationAggregate {
    pub fn color(&self, name: &str) -> Option<&ColorAggregate> {
        self.colors.iter().find(|c| c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Entity a ranking winner refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RankingKey {
    #[serde(rename_all = "camelCase")]
    Model { id: String, name: String },
    #[serde(rename_all = "camelCase")]
    Color { name: String },
    #[serde(rename_all = "camelCase")]
    Combination {
        model_id: String,
        model_name: String,
        modification: String,
        color: String,
    },
}

/// Argmax tuple for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub key: RankingKey,
    pub aggregate: Aggregate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg_price_never_divides_by_zero() {
        assert_eq!(Aggregate::default().avg_price(), 0.0);
        assert_eq!(Aggregate::new(0, 500.0).avg_price(), 0.0);
        assert_eq!(Aggregate::new(20, 150000.0).avg_price(), 7500.0);
    }

    #[test]
    fn test_merge_sums_both_fields() {
        let mut a = Aggregate::new(10, 100.0);
        a += Aggregate::new(5, 60.0);
        assert_eq!(a, Aggregate::new(15, 160.0));
    }

    #[test]
    fn test_ranking_key_is_tagged() {
        let key = RankingKey::Color {
            name: "Red".to_string(),
        };
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["kind"], "color");
        assert_eq!(json["name"], "Red");
    }

    #[test]
    fn test_add_saturates() {
        let mut aggregate = Aggregate::new(u64::MAX - 1, 1.0);
        aggregate.add(5, 1.0);
        assert_eq!(aggregate, Aggregate::new(u64::MAX, 2.0));

        aggregate += Aggregate::new(u64::MAX, 0.0);
        assert_eq!(aggregate.count, u64::MAX);
    }
}
