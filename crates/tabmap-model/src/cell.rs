//! Scalar cell values.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single table cell.
///
/// Ingestion produces typed values where the source format allows it;
/// generated output is mostly [`CellValue::Text`]. Two cells of different
/// kinds compare through their rendered text (see [`CellValue::loosely_equals`]).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    #[default]
    Empty,
}

impl CellValue {
    /// Creates a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the display form of the cell. `Empty` renders as `""`.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(v) => v.to_string(),
            Self::Float(v) if v.is_nan() => String::new(),
            Self::Float(v) => v.to_string(),
            Self::Empty => String::new(),
        }
    }

    /// True for `Empty`, NaN floats and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Float(v) => v.is_nan(),
            Self::Integer(_) => false,
        }
    }

    /// Compares two cells for grouping purposes.
    ///
    /// Same-kind cells compare exactly (NaN equals NaN, as a missing value
    /// does in the source frame); mixed kinds fall back to rendered text.
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Empty, Self::Empty) => true,
            _ => self.render() == other.render(),
        }
    }

    /// Converts a JSON value returned by the generation service.
    ///
    /// `null` becomes `Empty`; arrays and objects are kept as their compact
    /// JSON text so no information is dropped.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(true) => Self::text("True"),
            Value::Bool(false) => Self::text("False"),
            Value::Number(n) => match n.as_i64() {
                Some(v) => Self::Integer(v),
                None => n.as_f64().map_or(Self::Empty, Self::Float),
            },
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// JSON form used inside prompts. Missing values become `""`, never `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(v) => Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map_or_else(|| Value::String(String::new()), Value::Number),
            Self::Empty => Value::String(String::new()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}
