//! Native values produced by the value caster.
//!
//! Raw CDC values arrive as JSON (`serde_json::Value`). After casting, every
//! field is a [`CastValue`]: decoded temporal values, decoded bytes, or the raw
//! scalar passed through unchanged.

use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

/// A field value after schema-driven decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CastValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Nested objects, arrays and integers beyond `i64`
    Json(Value),
}

impl CastValue {
    /// Wrap a raw value without decoding it.
    pub fn passthrough(raw: &Value) -> Self {
        match raw {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if n.is_f64() {
                    n.as_f64().map_or_else(|| Self::Json(raw.clone()), Self::Float)
                } else {
                    Self::Json(raw.clone())
                }
            }
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Json(raw.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Members of a comma-joined SET column.
    ///
    /// Returns `None` for null and for non-text values. An empty string is a
    /// set with one empty member, matching a plain split on `,`.
    pub fn set_members(&self) -> Option<Vec<&str>> {
        self.as_str().map(|s| s.split(',').collect())
    }

    /// JSON rendering used for logging and dry runs.
    ///
    /// Dates and times use ISO-8601, bytes are base64 encoded.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
            Self::Bytes(b) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            Self::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
            Self::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Self::Json(v) => v.clone(),
        }
    }
}
