use serde::{Deserialize, Serialize};

use crate::shared::lenient::{LenientList, LenientNumber, LenientText};

/// One vehicle model as delivered by the upstream sales API.
///
/// All fields are optional at this level; the normalizer decides what is
/// required and what gets defaulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
    #[serde(default)]
    pub id: LenientText,
    #[serde(default)]
    pub name: LenientText,
    /// Image reference, display only
    #[serde(default)]
    pub photo_ref: LenientText,
    /// Signed contracts
    #[serde(default)]
    pub by_period: LenientList<RawPeriod>,
    /// Realized (delivered) contracts
    #[serde(default)]
    pub by_realized: LenientList<RawPeriod>,
    /// Cancelled contracts
    #[serde(default)]
    pub by_cancelled: LenientList<RawPeriod>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPeriod {
    /// "YYYY-MM" or "YYYY-MM-DD"
    #[serde(default)]
    pub period: LenientText,
    #[serde(default)]
    pub regions: LenientList<RawRegion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRegion {
    #[serde(default)]
    pub region_id: LenientText,
    #[serde(default)]
    pub region_name: LenientText,
    #[serde(default)]
    pub entries: LenientList<RawEntry>,
}

/// Leaf of the hierarchy: one modification/color cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    #[serde(default)]
    pub modification: LenientText,
    #[serde(default)]
    pub color: LenientText,
    #[serde(default)]
    pub count: LenientNumber,
    #[serde(default)]
    pub amount: LenientNumber,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_with_broken_fields_still_parses() {
        let raw: RawModel = serde_json::from_value(json!({
            "id": 7,
            "name": "Onix",
            "photoRef": "onix.png",
            "byPeriod": [{
                "period": "2024-03",
                "regions": [{
                    "regionId": "sp",
                    "regionName": "São Paulo",
                    "entries": [
                        {"modification": "LT", "color": "Red", "count": "3", "amount": 90000},
                        {"modification": "LTZ", "color": "Blue", "count": null, "amount": "n/a"},
                        "garbage"
                    ]
                }]
            }],
            "byRealized": "oops"
        }))
        .unwrap();

        assert_eq!(raw.id.as_deref(), Some("7"));
        assert_eq!(raw.photo_ref.as_deref(), Some("onix.png"));
        let region = &raw.by_period.items[0].regions.items[0];
        assert_eq!(region.entries.items.len(), 2);
        assert_eq!(region.entries.skipped, 1);
        assert_eq!(region.entries.items[0].count, LenientNumber::Coerced(3.0));
        assert!(region.entries.items[1].count.is_recovered());
        assert!(!raw.by_realized.present);
        assert!(!raw.by_cancelled.present);
    }
}
