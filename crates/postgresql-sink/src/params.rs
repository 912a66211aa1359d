//! Conversion of cast values into PostgreSQL parameters.
//!
//! Values are converted against the parameter types the server reports for
//! the prepared statement, so an integer decoded from JSON can be bound to an
//! `int2`, `int4`, `numeric` or `bool` column alike.

use crate::error::{Result, SinkError};
use bytes::BytesMut;
use chrono::NaiveTime;
use postgres_types::{to_sql_checked, IsNull, ToSql, Type};
use replay_core::CastValue;
use rust_decimal::Decimal;
use std::error::Error;

/// SQL NULL for a parameter of any type.
#[derive(Debug, Clone, Copy)]
pub struct SqlNull;

impl ToSql for SqlNull {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn is_text(ty: &Type) -> bool {
    [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty)
}

fn is_text_array(ty: &Type) -> bool {
    [Type::TEXT_ARRAY, Type::VARCHAR_ARRAY].contains(ty)
}

fn conversion_error(value: &CastValue, ty: &Type, message: impl ToString) -> SinkError {
    SinkError::Conversion {
        ty: ty.name().to_string(),
        value: value.to_json().to_string(),
        message: message.to_string(),
    }
}

/// Convert a CastValue to a boxed ToSql trait object for a parameter of `ty`.
///
/// Combinations without a dedicated conversion bind the value's natural
/// PostgreSQL type and leave the type check to the driver.
pub fn to_sql_param(value: &CastValue, ty: &Type) -> Result<Box<dyn ToSql + Sync + Send>> {
    let param: Box<dyn ToSql + Sync + Send> = match value {
        CastValue::Null => Box::new(SqlNull),
        CastValue::Bool(b) => {
            if is_text(ty) {
                Box::new(b.to_string())
            } else {
                Box::new(*b)
            }
        }
        CastValue::Int(i) => {
            if *ty == Type::INT2 {
                Box::new(i16::try_from(*i).map_err(|e| conversion_error(value, ty, e))?)
            } else if *ty == Type::INT4 {
                Box::new(i32::try_from(*i).map_err(|e| conversion_error(value, ty, e))?)
            } else if *ty == Type::FLOAT4 {
                Box::new(*i as f32)
            } else if *ty == Type::FLOAT8 {
                Box::new(*i as f64)
            } else if *ty == Type::NUMERIC {
                Box::new(Decimal::from(*i))
            } else if *ty == Type::BOOL {
                // MySQL-origin tinyint(1) columns arrive as 0/1
                Box::new(*i != 0)
            } else if is_text(ty) {
                Box::new(i.to_string())
            } else {
                Box::new(*i)
            }
        }
        CastValue::Float(f) => {
            if *ty == Type::FLOAT4 {
                Box::new(*f as f32)
            } else if *ty == Type::NUMERIC {
                let decimal = Decimal::from_f64_retain(*f)
                    .ok_or_else(|| conversion_error(value, ty, "not representable as numeric"))?;
                Box::new(decimal)
            } else if is_text(ty) {
                Box::new(f.to_string())
            } else {
                Box::new(*f)
            }
        }
        CastValue::Text(s) => {
            if is_text_array(ty) {
                let members: Vec<String> = value
                    .set_members()
                    .unwrap_or_default()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                Box::new(members)
            } else if *ty == Type::UUID {
                Box::new(uuid::Uuid::parse_str(s).map_err(|e| conversion_error(value, ty, e))?)
            } else if *ty == Type::NUMERIC {
                Box::new(
                    s.parse::<Decimal>()
                        .map_err(|e| conversion_error(value, ty, e))?,
                )
            } else if *ty == Type::JSON || *ty == Type::JSONB {
                let json = serde_json::from_str::<serde_json::Value>(s)
                    .unwrap_or_else(|_| serde_json::Value::String(s.clone()));
                Box::new(json)
            } else {
                Box::new(s.clone())
            }
        }
        CastValue::Bytes(b) => Box::new(b.clone()),
        CastValue::Date(d) => {
            if *ty == Type::TIMESTAMP {
                Box::new(d.and_time(NaiveTime::MIN))
            } else if *ty == Type::TIMESTAMPTZ {
                Box::new(d.and_time(NaiveTime::MIN).and_utc())
            } else if is_text(ty) {
                Box::new(d.to_string())
            } else {
                Box::new(*d)
            }
        }
        CastValue::Time(t) => {
            if is_text(ty) {
                Box::new(t.to_string())
            } else {
                Box::new(*t)
            }
        }
        CastValue::DateTime(dt) => {
            if *ty == Type::TIMESTAMPTZ {
                Box::new(dt.and_utc())
            } else if *ty == Type::DATE {
                Box::new(dt.date())
            } else if is_text(ty) {
                Box::new(dt.to_string())
            } else {
                Box::new(*dt)
            }
        }
        CastValue::Json(v) => {
            if is_text(ty) {
                Box::new(v.to_string())
            } else {
                Box::new(v.clone())
            }
        }
    };
    Ok(param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn encode(value: &CastValue, ty: &Type) -> (IsNull, BytesMut) {
        let param = to_sql_param(value, ty).unwrap();
        let mut buf = BytesMut::new();
        let is_null = param.to_sql_checked(ty, &mut buf).unwrap();
        (is_null, buf)
    }

    #[test]
    fn test_null_binds_to_any_type() {
        for ty in [Type::INT8, Type::DATE, Type::BYTEA, Type::JSONB] {
            let (is_null, buf) = encode(&CastValue::Null, &ty);
            assert!(matches!(is_null, IsNull::Yes));
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_int_narrows_to_column_type() {
        let (_, buf) = encode(&CastValue::Int(5), &Type::INT4);
        assert_eq!(&buf[..], &5_i32.to_be_bytes());

        let (_, buf) = encode(&CastValue::Int(5), &Type::INT2);
        assert_eq!(&buf[..], &5_i16.to_be_bytes());

        let (_, buf) = encode(&CastValue::Int(5), &Type::INT8);
        assert_eq!(&buf[..], &5_i64.to_be_bytes());
    }

    #[test]
    fn test_int_overflow_is_rejected() {
        let err = to_sql_param(&CastValue::Int(70_000), &Type::INT2).err().unwrap();
        assert!(err.to_string().contains("int2"), "{err}");
    }

    #[test]
    fn test_int_to_bool() {
        let (_, buf) = encode(&CastValue::Int(1), &Type::BOOL);
        assert_eq!(&buf[..], &[1]);
    }

    #[test]
    fn test_datetime_to_timestamptz() {
        let dt = NaiveDateTime::parse_from_str("2000-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let (_, buf) = encode(&CastValue::DateTime(dt), &Type::TIMESTAMPTZ);
        // PostgreSQL timestamps count microseconds from 2000-01-01
        assert_eq!(&buf[..], &0_i64.to_be_bytes());
    }

    #[test]
    fn test_date_binds_as_date() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 2).unwrap();
        let (_, buf) = encode(&CastValue::Date(date), &Type::DATE);
        assert_eq!(&buf[..], &1_i32.to_be_bytes());
    }

    #[test]
    fn test_set_to_text_array() {
        let (is_null, buf) = encode(&CastValue::Text("a,b".to_string()), &Type::TEXT_ARRAY);
        assert!(matches!(is_null, IsNull::No));
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_invalid_uuid_is_rejected() {
        assert!(to_sql_param(&CastValue::Text("nope".to_string()), &Type::UUID).is_err());
    }

    #[test]
    fn test_bytes() {
        let (_, buf) = encode(&CastValue::Bytes(b"hello".to_vec()), &Type::BYTEA);
        assert_eq!(&buf[..], b"hello");
    }
}
