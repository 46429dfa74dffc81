//! Value conversion utilities between SeaQuery and may_postgres.
//!
//! Outbound, `sea_query::Values` are turned into `ToSql` parameters. The
//! conversion follows a two-pass pattern:
//! 1. First pass: collect all values into typed vectors
//! 2. Second pass: create references to the stored values
//!
//! This keeps every reference valid for the duration of the closure.
//!
//! Inbound, rows are decoded column by column into [`Attributes`] using the
//! Postgres column type.

use crate::executor::LifeError;
use crate::value::Attributes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use may_postgres::types::{ToSql, Type};
use may_postgres::Row;
use sea_query::Value;

/// Convert SeaQuery values to may_postgres ToSql parameters and run `f` with them.
///
/// # Errors
///
/// Returns `LifeError::Other` if an unsupported value type is encountered.
pub fn with_converted_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, LifeError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, LifeError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut bytes: Vec<Vec<u8>> = Vec::new();
    let mut nulls: Vec<Option<i32>> = Vec::new();
    let mut floats: Vec<f32> = Vec::new();
    let mut doubles: Vec<f64> = Vec::new();
    let mut jsons: Vec<serde_json::Value> = Vec::new();
    let mut timestamps: Vec<NaiveDateTime> = Vec::new();
    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut timestamps_tz: Vec<DateTime<Utc>> = Vec::new();

    // First pass: collect all values into typed vectors
    for value in values.iter() {
        if crate::value::is_null(value) {
            nulls.push(None);
            continue;
        }
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::TinyInt(Some(i)) => ints.push(i32::from(*i)),
            Value::SmallInt(Some(i)) => ints.push(i32::from(*i)),
            Value::Int(Some(i)) => ints.push(*i),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::TinyUnsigned(Some(u)) => ints.push(i32::from(*u)),
            Value::SmallUnsigned(Some(u)) => ints.push(i32::from(*u)),
            Value::Unsigned(Some(u)) => big_ints.push(i64::from(*u)),
            Value::BigUnsigned(Some(u)) => {
                let converted = i64::try_from(*u).map_err(|_| {
                    LifeError::Other(format!("BigUnsigned value {u} exceeds i64::MAX"))
                })?;
                big_ints.push(converted);
            }
            Value::Float(Some(f)) => floats.push(*f),
            Value::Double(Some(d)) => doubles.push(*d),
            Value::String(Some(s)) => strings.push(s.clone()),
            Value::Bytes(Some(b)) => bytes.push(b.clone()),
            Value::Json(Some(j)) => {
                let j: &serde_json::Value = j;
                jsons.push(j.clone());
            }
            Value::ChronoDateTime(Some(dt)) => {
                let dt: &NaiveDateTime = dt;
                timestamps.push(*dt);
            }
            Value::ChronoDate(Some(d)) => {
                let d: &NaiveDate = d;
                dates.push(*d);
            }
            Value::ChronoDateTimeUtc(Some(dt)) => {
                let dt: &DateTime<Utc> = dt;
                timestamps_tz.push(*dt);
            }
            _ => {
                return Err(LifeError::Other(format!(
                    "Unsupported value type in query: {value:?}"
                )));
            }
        }
    }

    // Second pass: create references to the stored values
    let mut bool_idx = 0;
    let mut int_idx = 0;
    let mut big_int_idx = 0;
    let mut string_idx = 0;
    let mut byte_idx = 0;
    let mut null_idx = 0;
    let mut float_idx = 0;
    let mut double_idx = 0;
    let mut json_idx = 0;
    let mut timestamp_idx = 0;
    let mut date_idx = 0;
    let mut timestamp_tz_idx = 0;

    let mut params: Vec<&dyn ToSql> = Vec::new();

    for value in values.iter() {
        if crate::value::is_null(value) {
            params.push(&nulls[null_idx] as &dyn ToSql);
            null_idx += 1;
            continue;
        }
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx] as &dyn ToSql);
                bool_idx += 1;
            }
            Value::TinyInt(Some(_))
            | Value::SmallInt(Some(_))
            | Value::Int(Some(_))
            | Value::TinyUnsigned(Some(_))
            | Value::SmallUnsigned(Some(_)) => {
                params.push(&ints[int_idx] as &dyn ToSql);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) | Value::Unsigned(Some(_)) | Value::BigUnsigned(Some(_)) => {
                params.push(&big_ints[big_int_idx] as &dyn ToSql);
                big_int_idx += 1;
            }
            Value::Float(Some(_)) => {
                params.push(&floats[float_idx] as &dyn ToSql);
                float_idx += 1;
            }
            Value::Double(Some(_)) => {
                params.push(&doubles[double_idx] as &dyn ToSql);
                double_idx += 1;
            }
            Value::String(Some(_)) => {
                params.push(&strings[string_idx] as &dyn ToSql);
                string_idx += 1;
            }
            Value::Bytes(Some(_)) => {
                params.push(&bytes[byte_idx] as &dyn ToSql);
                byte_idx += 1;
            }
            Value::Json(Some(_)) => {
                params.push(&jsons[json_idx] as &dyn ToSql);
                json_idx += 1;
            }
            Value::ChronoDateTime(Some(_)) => {
                params.push(&timestamps[timestamp_idx] as &dyn ToSql);
                timestamp_idx += 1;
            }
            Value::ChronoDate(Some(_)) => {
                params.push(&dates[date_idx] as &dyn ToSql);
                date_idx += 1;
            }
            Value::ChronoDateTimeUtc(Some(_)) => {
                params.push(&timestamps_tz[timestamp_tz_idx] as &dyn ToSql);
                timestamp_tz_idx += 1;
            }
            _ => {
                return Err(LifeError::Other(format!(
                    "Unsupported value type in query: {value:?}"
                )));
            }
        }
    }

    f(&params)
}

/// Decode a `may_postgres` row into an attribute map keyed by column name.
///
/// # Errors
///
/// Returns `LifeError::ParseError` when a column cannot be read as its declared type.
pub fn row_to_attributes(row: &Row) -> Result<Attributes, LifeError> {
    let mut attributes = Attributes::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_()).map_err(|e| {
            LifeError::ParseError(format!("column {}: {e}", column.name()))
        })?;
        attributes.insert(column.name().to_string(), value);
    }
    Ok(attributes)
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> Result<Value, may_postgres::Error> {
    let value = if *ty == Type::BOOL {
        Value::Bool(row.try_get::<_, Option<bool>>(idx)?)
    } else if *ty == Type::INT2 {
        Value::SmallInt(row.try_get::<_, Option<i16>>(idx)?)
    } else if *ty == Type::INT4 {
        Value::Int(row.try_get::<_, Option<i32>>(idx)?)
    } else if *ty == Type::INT8 {
        Value::BigInt(row.try_get::<_, Option<i64>>(idx)?)
    } else if *ty == Type::FLOAT4 {
        Value::Float(row.try_get::<_, Option<f32>>(idx)?)
    } else if *ty == Type::FLOAT8 {
        Value::Double(row.try_get::<_, Option<f64>>(idx)?)
    } else if *ty == Type::BYTEA {
        Value::Bytes(row.try_get::<_, Option<Vec<u8>>>(idx)?)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        match row.try_get::<_, Option<serde_json::Value>>(idx)? {
            Some(json) => Value::from(json),
            None => Value::Json(None),
        }
    } else if *ty == Type::TIMESTAMP {
        match row.try_get::<_, Option<NaiveDateTime>>(idx)? {
            Some(dt) => Value::from(dt),
            None => Value::ChronoDateTime(None),
        }
    } else if *ty == Type::TIMESTAMPTZ {
        match row.try_get::<_, Option<DateTime<Utc>>>(idx)? {
            Some(dt) => Value::from(dt),
            None => Value::ChronoDateTimeUtc(None),
        }
    } else if *ty == Type::DATE {
        match row.try_get::<_, Option<NaiveDate>>(idx)? {
            Some(date) => Value::from(date),
            None => Value::ChronoDate(None),
        }
    } else {
        // TEXT, VARCHAR, BPCHAR, NAME and anything else with a text representation
        Value::String(row.try_get::<_, Option<String>>(idx)?)
    };
    Ok(value)
}
