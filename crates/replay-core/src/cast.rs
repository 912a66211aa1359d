//! Schema-driven casting of raw CDC values.
//!
//! Each field's [`FieldKind`] selects the decoder:
//!
//! | Kind | Raw encoding | Result |
//! |------|--------------|--------|
//! | `Date` | days since epoch | [`CastValue::Date`] |
//! | `Time` | ms since midnight | [`CastValue::Time`] |
//! | `DateTimeMilli`, `Timestamp` | ms since epoch | [`CastValue::DateTime`] |
//! | `DateTimeMicro` | µs since epoch | [`CastValue::DateTime`] |
//! | `Binary` | base64 text | [`CastValue::Bytes`] |
//! | `Set`, `Passthrough` | anything | unchanged |
//!
//! JSON `null` stays [`CastValue::Null`] for every kind.

use crate::error::{ReplayError, Result, TemporalError};
use crate::record::RowImage;
use crate::schema::{FieldClassification, FieldKind, SchemaRegistry};
use crate::temporal::{days_to_date, micros_to_datetime, millis_to_datetime, millis_to_time};
use crate::values::CastValue;
use base64::Engine;
use serde_json::Value;
use tracing::trace;

/// Casts ordered field values of a table using a [`SchemaRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct ValueCaster<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> ValueCaster<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Cast `values` positionally against `fields` of `table`.
    ///
    /// The output has the same length and order as the input.
    pub fn cast<S: AsRef<str>>(
        &self,
        table: &str,
        fields: &[S],
        values: &[Value],
    ) -> Result<Vec<CastValue>> {
        let classification = self.registry.classification_for(table)?;
        if fields.len() != values.len() {
            return Err(ReplayError::ArityMismatch {
                table: table.to_string(),
                fields: fields.len(),
                values: values.len(),
            });
        }

        fields
            .iter()
            .zip(values)
            .map(|(field, raw)| cast_value(classification, field.as_ref(), raw))
            .collect()
    }

    /// Cast every column of a row image, in image order.
    pub fn cast_image(&self, table: &str, image: &RowImage) -> Result<Vec<CastValue>> {
        let classification = self.registry.classification_for(table)?;
        image
            .iter()
            .map(|(column, raw)| cast_value(classification, column, raw))
            .collect()
    }
}

/// Cast a single raw value of `column`.
pub fn cast_value(
    classification: &FieldClassification,
    column: &str,
    raw: &Value,
) -> Result<CastValue> {
    if raw.is_null() {
        return Ok(CastValue::Null);
    }

    let kind = classification.kind_of(column);
    trace!(
        "Casting {}.{} as {}",
        classification.table(),
        column,
        kind.config_key()
    );

    let temporal = |result: std::result::Result<CastValue, TemporalError>| {
        result.map_err(|source| ReplayError::InvalidTemporalValue {
            table: classification.table().to_string(),
            column: column.to_string(),
            raw: raw.to_string(),
            source,
        })
    };

    match kind {
        FieldKind::Date => temporal(integer(raw).and_then(days_to_date).map(CastValue::Date)),
        FieldKind::Time => temporal(integer(raw).and_then(millis_to_time).map(CastValue::Time)),
        FieldKind::DateTimeMilli | FieldKind::Timestamp => temporal(
            integer(raw)
                .and_then(millis_to_datetime)
                .map(CastValue::DateTime),
        ),
        FieldKind::DateTimeMicro => temporal(
            integer(raw)
                .and_then(micros_to_datetime)
                .map(CastValue::DateTime),
        ),
        FieldKind::Binary => decode_binary(raw)
            .map(CastValue::Bytes)
            .map_err(|message| ReplayError::InvalidEncoding {
                table: classification.table().to_string(),
                column: column.to_string(),
                message,
            }),
        FieldKind::Set | FieldKind::Passthrough => Ok(CastValue::passthrough(raw)),
    }
}

fn integer(raw: &Value) -> std::result::Result<i64, TemporalError> {
    raw.as_i64().ok_or_else(|| TemporalError::NotAnInteger {
        found: json_type_name(raw).to_string(),
    })
}

fn decode_binary(raw: &Value) -> std::result::Result<Vec<u8>, String> {
    let text = raw
        .as_str()
        .ok_or_else(|| format!("expected base64 text, got {}", json_type_name(raw)))?;
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|e| e.to_string())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;

    const CONFIG: &str = r#"
users:
  date_fields: [birthday]
  time_fields: [wake_up]
  datetime_milli_fields: [created_at]
  datetime_micro_fields: [updated_at]
  timestamp_fields: [last_login]
  binary_fields: [avatar]
  set_fields: [roles]
"#;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_yaml(CONFIG).unwrap()
    }

    #[test]
    fn test_cast_every_kind() {
        let registry = registry();
        let caster = ValueCaster::new(&registry);
        let fields = [
            "birthday",
            "wake_up",
            "created_at",
            "updated_at",
            "last_login",
            "avatar",
            "roles",
            "name",
        ];
        let values = [
            json!(19_737),
            json!(25_200_250),
            json!(1_705_314_600_000_i64),
            json!(1_705_314_600_000_001_i64),
            json!(1_000),
            json!("aGVsbG8="),
            json!("admin,editor"),
            json!("Alice"),
        ];

        let cast = caster.cast("users", &fields, &values).unwrap();
        let jan_15 = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            cast,
            vec![
                CastValue::Date(jan_15),
                CastValue::Time(NaiveTime::from_hms_milli_opt(7, 0, 0, 250).unwrap()),
                CastValue::DateTime(jan_15.and_hms_opt(10, 30, 0).unwrap()),
                CastValue::DateTime(jan_15.and_hms_micro_opt(10, 30, 0, 1).unwrap()),
                CastValue::DateTime(
                    NaiveDate::from_ymd_opt(1970, 1, 1)
                        .unwrap()
                        .and_hms_opt(0, 0, 1)
                        .unwrap()
                ),
                CastValue::Bytes(b"hello".to_vec()),
                CastValue::Text("admin,editor".to_string()),
                CastValue::Text("Alice".to_string()),
            ]
        );
    }

    #[test]
    fn test_cast_preserves_order() {
        let registry = registry();
        let caster = ValueCaster::new(&registry);
        let fields = ["name", "birthday", "age"];
        let values = [json!("Bob"), json!(1), json!(30)];
        let cast = caster.cast("users", &fields, &values).unwrap();
        assert_eq!(cast.len(), 3);
        assert_eq!(cast[0], CastValue::Text("Bob".to_string()));
        assert_eq!(cast[1].as_date(), NaiveDate::from_ymd_opt(1970, 1, 2));
        assert_eq!(cast[2], CastValue::Int(30));
    }

    #[test]
    fn test_arity_mismatch() {
        let registry = registry();
        let caster = ValueCaster::new(&registry);
        let err = caster
            .cast("users", &["name", "age"], &[json!("Bob")])
            .unwrap_err();
        assert!(matches!(
            err,
            ReplayError::ArityMismatch {
                fields: 2,
                values: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_table() {
        let registry = registry();
        let caster = ValueCaster::new(&registry);
        let err = caster
            .cast("orders", &["id"], &[json!(1)])
            .unwrap_err();
        assert!(matches!(err, ReplayError::UnknownTable { .. }));
    }

    #[test]
    fn test_invalid_base64() {
        let registry = registry();
        let caster = ValueCaster::new(&registry);
        let err = caster
            .cast("users", &["avatar"], &[json!("not base64!")])
            .unwrap_err();
        match err {
            ReplayError::InvalidEncoding { table, column, .. } => {
                assert_eq!(table, "users");
                assert_eq!(column, "avatar");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = caster
            .cast("users", &["avatar"], &[json!(12)])
            .unwrap_err();
        assert!(matches!(err, ReplayError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_invalid_temporal_values() {
        let registry = registry();
        let caster = ValueCaster::new(&registry);

        let err = caster
            .cast("users", &["wake_up"], &[json!(90_000_000)])
            .unwrap_err();
        match err {
            ReplayError::InvalidTemporalValue {
                column,
                raw,
                source,
                ..
            } => {
                assert_eq!(column, "wake_up");
                assert_eq!(raw, "90000000");
                assert_eq!(source, TemporalError::NotTimeOfDay { millis: 90_000_000 });
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = caster
            .cast("users", &["birthday"], &[json!("2024-01-15")])
            .unwrap_err();
        assert!(matches!(
            err,
            ReplayError::InvalidTemporalValue {
                source: TemporalError::NotAnInteger { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_null_passes_through_every_kind() {
        let registry = registry();
        let caster = ValueCaster::new(&registry);
        let fields = ["birthday", "wake_up", "updated_at", "avatar", "roles"];
        let values = vec![json!(null); fields.len()];
        let cast = caster.cast("users", &fields, &values).unwrap();
        assert!(cast.iter().all(CastValue::is_null));
    }

    #[test]
    fn test_cast_image_uses_image_order() {
        let registry = registry();
        let caster = ValueCaster::new(&registry);
        let image = match json!({"roles": "a,b", "birthday": 0}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let cast = caster.cast_image("users", &image).unwrap();
        assert_eq!(
            cast,
            vec![
                CastValue::Text("a,b".to_string()),
                CastValue::Date(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
            ]
        );
    }
}
