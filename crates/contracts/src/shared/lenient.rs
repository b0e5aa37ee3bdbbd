//! Field types for loosely-typed upstream payloads.
//!
//! Every type here deserializes from *any* JSON value without failing, so a
//! single malformed field can never reject the enclosing record. Callers
//! inspect the result to find out whether a value had to be recovered.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// A numeric field that may arrive as a number, a numeric string, or garbage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LenientNumber {
    /// Field absent or `null`.
    #[default]
    Missing,
    /// A finite JSON number.
    Valid(f64),
    /// A finite number parsed out of a string (`"12"`, `" 1500.5 "`).
    Coerced(f64),
    /// Present but not interpretable as a finite number.
    Invalid,
}

impl LenientNumber {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Missing,
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => Self::Valid(f),
                _ => Self::Invalid,
            },
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Self::Coerced(f),
                _ => Self::Invalid,
            },
            _ => Self::Invalid,
        }
    }

    /// Raw numeric value, `0` when missing or invalid.
    pub fn value(&self) -> f64 {
        match self {
            Self::Valid(f) | Self::Coerced(f) => *f,
            Self::Missing | Self::Invalid => 0.0,
        }
    }

    /// True when the value had to be defaulted (missing or unparseable).
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Missing | Self::Invalid)
    }

    pub fn is_negative(&self) -> bool {
        self.value() < 0.0
    }

    /// Non-negative whole count; fractions are truncated, negatives floored to 0.
    pub fn as_count(&self) -> u64 {
        let v = self.value();
        if v <= 0.0 {
            0
        } else {
            v.trunc() as u64
        }
    }

    /// Non-negative monetary amount.
    pub fn as_amount(&self) -> f64 {
        self.value().max(0.0)
    }
}

impl<'de> Deserialize<'de> for LenientNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Serialize for LenientNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Valid(f) | Self::Coerced(f) => serializer.serialize_f64(*f),
            Self::Missing | Self::Invalid => serializer.serialize_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Identifier or label that may arrive as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LenientText(pub Option<String>);

impl LenientText {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self(Some(s.trim().to_string())),
            Value::Number(n) => Self(Some(n.to_string())),
            _ => Self(None),
        }
    }

    /// The text, or `None` when absent, not textual, or blank.
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref().filter(|s| !s.is_empty())
    }

    pub fn to_owned_or(&self, fallback: &str) -> String {
        self.as_deref().unwrap_or(fallback).to_string()
    }
}

impl<'de> Deserialize<'de> for LenientText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Serialize for LenientText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// A nested array whose elements are parsed one by one.
///
/// Elements that fail to deserialize are counted in `skipped` instead of
/// failing the whole list. A missing, `null` or non-array field yields an
/// empty list with `present == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct LenientList<T> {
    pub items: Vec<T>,
    pub skipped: usize,
    pub present: bool,
}

impl<T> Default for LenientList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
            present: false,
        }
    }
}

impl<T: DeserializeOwned> LenientList<T> {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                let mut skipped = 0;
                for element in elements {
                    match serde_json::from_value::<T>(element) {
                        Ok(item) => items.push(item),
                        Err(_) => skipped += 1,
                    }
                }
                Self {
                    items,
                    skipped,
                    present: true,
                }
            }
            _ => Self::default(),
        }
    }
}

impl<T> LenientList<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for LenientList<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

impl<T: Serialize> Serialize for LenientList<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.items.serialize(serializer)
    }
}
