//! FILENAME: core/pivot-core/src/value.rs
//! Cell values as the pivot core sees them.
//!
//! Records hand the core loosely typed cells: numbers, text, option lists,
//! member/link objects and so on. `CellValue` is the closed set of shapes the
//! core understands. Every axis label is the canonical JSON serialization of
//! a `CellValue`, so labels group by string equality and can be parsed back
//! for ordering.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::PivotResult;

/// Largest integer magnitude that survives an f64 round trip.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// ============================================================================
// CELL VALUE
// ============================================================================

/// A single cell value read from a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<CellValue>),
    /// An object cell (member, linked record, select option, attachment).
    /// Only the identifying keys take part in grouping and ordering.
    Labeled(Labeled),
}

/// Identifying keys of an object cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Labeled {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Labeled {
    pub fn named(name: impl Into<String>) -> Self {
        Labeled {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Labeled {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Text shown for this object: its name, else its title.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("")
    }
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Script-style truthiness: null, false, 0, NaN and "" are falsy.
    /// Lists and objects are always truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Text(s) => !s.is_empty(),
            CellValue::List(_) | CellValue::Labeled(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Numeric views used by the aggregator
    // ------------------------------------------------------------------------

    /// Sum of the cell: numbers as-is, lists summed element-wise, else 0.
    pub fn numeric_sum(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::List(items) => items.iter().map(CellValue::numeric_sum).sum(),
            _ => 0.0,
        }
    }

    /// How many values the cell contributes to an average.
    pub fn numeric_count(&self) -> f64 {
        match self {
            CellValue::List(items) => items.len() as f64,
            _ => 1.0,
        }
    }

    /// Largest number in the cell, reducing lists first.
    pub fn numeric_max(&self) -> Option<f64> {
        self.numeric_extreme(f64::max)
    }

    /// Smallest number in the cell, reducing lists first.
    pub fn numeric_min(&self) -> Option<f64> {
        self.numeric_extreme(f64::min)
    }

    fn numeric_extreme(&self, pick: fn(f64, f64) -> f64) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            CellValue::List(items) => items
                .iter()
                .filter_map(|item| item.numeric_extreme(pick))
                .reduce(pick),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Canonical serialization
    // ------------------------------------------------------------------------

    /// Canonical JSON text for this value. Integral numbers print without a
    /// fraction and non-finite numbers print as `null`.
    pub fn canonical(&self) -> String {
        self.to_json().to_string()
    }

    /// Parses text produced by [`CellValue::canonical`].
    pub fn parse_canonical(text: &str) -> PivotResult<CellValue> {
        let json: Value = serde_json::from_str(text)?;
        Ok(CellValue::from_json(&json))
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Number(n) => number_to_json(*n),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::List(items) => Value::Array(items.iter().map(CellValue::to_json).collect()),
            CellValue::Labeled(obj) => {
                let mut map = Map::new();
                if let Some(id) = &obj.id {
                    map.insert("id".to_string(), Value::String(id.clone()));
                }
                if let Some(name) = &obj.name {
                    map.insert("name".to_string(), Value::String(name.clone()));
                }
                if let Some(title) = &obj.title {
                    map.insert("title".to_string(), Value::String(title.clone()));
                }
                Value::Object(map)
            }
        }
    }

    pub fn from_json(json: &Value) -> CellValue {
        match json {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(CellValue::Null, CellValue::Number),
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Array(items) => CellValue::List(items.iter().map(CellValue::from_json).collect()),
            Value::Object(map) => CellValue::Labeled(Labeled {
                id: map.get("id").and_then(json_key_text),
                name: map.get("name").and_then(json_key_text),
                title: map.get("title").and_then(json_key_text),
            }),
        }
    }

    /// Plain text form: lists join with ",", objects show their label.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::List(items) => items
                .iter()
                .map(CellValue::display_text)
                .collect::<Vec<_>>()
                .join(","),
            CellValue::Labeled(obj) => obj.label().to_string(),
        }
    }
}

fn number_to_json(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn json_key_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Formats a number the way cells display it: integral values without a
/// fraction, everything else in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Labeled> for CellValue {
    fn from(value: Labeled) -> Self {
        CellValue::Labeled(value)
    }
}

impl<T: Into<CellValue>> From<Vec<T>> for CellValue {
    fn from(values: Vec<T>) -> Self {
        CellValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|json| CellValue::from_json(&json))
    }
}
