//! Decoding of a single JSON change record.
//!
//! Two shapes are accepted:
//!
//! ```text
//! flat:     {"table": "users", "op": "u", "before": {...}, "after": {...}}
//! debezium: {"payload": {"op": "u", "before": {...}, "after": {...},
//!                        "source": {"table": "users", ...}}}
//! ```
//!
//! The `payload` wrapper is optional. `op` may be omitted, in which case the
//! kind is inferred from the images later on. Null images are empty.

use crate::error::{Result, SourceError};
use replay_core::{ChangeKind, ChangeRecord, RowImage};
use serde_json::{Map, Value};

/// Decode one parsed line into a [`ChangeRecord`].
pub fn parse_record(value: Value, line: usize) -> Result<ChangeRecord> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(invalid(
                line,
                format!("expected a JSON object, got {}", type_name(&other)),
            ))
        }
    };

    if let Some(payload) = object.remove("payload") {
        object = match payload {
            Value::Object(inner) => inner,
            other => {
                return Err(invalid(
                    line,
                    format!("'payload' must be an object, got {}", type_name(&other)),
                ))
            }
        };
    }

    let table = table_name(&object, line)?;
    let op = match object.get("op") {
        None | Some(Value::Null) => None,
        Some(Value::String(code)) => Some(ChangeKind::from_op_code(code).ok_or_else(|| {
            SourceError::UnknownOperation {
                line,
                op: code.clone(),
            }
        })?),
        Some(other) => {
            return Err(invalid(
                line,
                format!("'op' must be a string, got {}", type_name(other)),
            ))
        }
    };
    let before = row_image(&mut object, "before", line)?;
    let after = row_image(&mut object, "after", line)?;

    Ok(ChangeRecord {
        table,
        op,
        before,
        after,
    })
}

fn table_name(object: &Map<String, Value>, line: usize) -> Result<String> {
    if let Some(Value::String(table)) = object.get("table") {
        return Ok(table.clone());
    }
    match object.get("source").and_then(|source| source.get("table")) {
        Some(Value::String(table)) => Ok(table.clone()),
        _ => Err(invalid(
            line,
            "missing table name ('table' or 'source.table')".to_string(),
        )),
    }
}

fn row_image(object: &mut Map<String, Value>, key: &str, line: usize) -> Result<RowImage> {
    match object.remove(key) {
        None | Some(Value::Null) => Ok(RowImage::new()),
        Some(Value::Object(image)) => Ok(image),
        Some(other) => Err(invalid(
            line,
            format!("'{key}' must be an object or null, got {}", type_name(&other)),
        )),
    }
}

fn invalid(line: usize, message: String) -> SourceError {
    SourceError::InvalidRecord { line, message }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
