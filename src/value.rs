//! Attribute storage and `sea_query::Value` helpers.
//!
//! Records keep their attributes as `sea_query::Value`, the same value type the
//! query builder binds. `sea_query` nulls are typed (`Value::String(None)`,
//! `Value::Int(None)`, ...), so "is this attribute null" has to look at every
//! variant rather than compare against a single null.

use chrono::{NaiveDate, NaiveDateTime};
use sea_query::Value;
use std::collections::BTreeMap;

/// Attribute name to value, ordered by name.
pub type Attributes = BTreeMap<String, Value>;

/// The untyped null used when a transform clears an attribute.
pub fn null() -> Value {
    Value::String(None)
}

/// Returns `true` for every `None` variant of `sea_query::Value`.
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::ChronoDateTimeLocal(None)
            | Value::ChronoDateTimeWithTimeZone(None)
    )
}

/// Borrow the string payload of a `Value::String`.
pub fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(Some(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// Extract a timestamp from the chrono variants.
///
/// Dates are widened to midnight. Zoned timestamps keep their wall-clock time.
pub fn as_naive_date_time(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::ChronoDateTime(Some(dt)) => {
            let dt: &NaiveDateTime = dt;
            Some(*dt)
        }
        Value::ChronoDate(Some(date)) => {
            let date: &NaiveDate = date;
            Some(date.and_time(chrono::NaiveTime::MIN))
        }
        Value::ChronoDateTimeUtc(Some(dt)) => {
            let dt: &chrono::DateTime<chrono::Utc> = dt;
            Some(dt.naive_utc())
        }
        Value::ChronoDateTimeLocal(Some(dt)) => {
            let dt: &chrono::DateTime<chrono::Local> = dt;
            Some(dt.naive_local())
        }
        Value::ChronoDateTimeWithTimeZone(Some(dt)) => {
            let dt: &chrono::DateTime<chrono::FixedOffset> = dt;
            Some(dt.naive_local())
        }
        _ => None,
    }
}

/// Lenient integer read, used for aggregate columns such as `count`.
///
/// Mirrors an `(int)` cast: numeric strings are parsed, anything else is `0`.
pub fn as_i64(value: &Value) -> i64 {
    match value {
        Value::TinyInt(Some(v)) => i64::from(*v),
        Value::SmallInt(Some(v)) => i64::from(*v),
        Value::Int(Some(v)) => i64::from(*v),
        Value::BigInt(Some(v)) => *v,
        Value::TinyUnsigned(Some(v)) => i64::from(*v),
        Value::SmallUnsigned(Some(v)) => i64::from(*v),
        Value::Unsigned(Some(v)) => i64::from(*v),
        Value::BigUnsigned(Some(v)) => i64::try_from(*v).unwrap_or(i64::MAX),
        Value::Float(Some(v)) => *v as i64,
        Value::Double(Some(v)) => *v as i64,
        Value::Bool(Some(v)) => i64::from(*v),
        Value::String(Some(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

/// Render a value the way it appears inside a cache index.
///
/// Strings are used verbatim, numbers in their shortest form, booleans as `1`/``
/// and nulls as the empty string.
pub fn to_index_fragment(value: &Value) -> String {
    if is_null(value) {
        return String::new();
    }
    match value {
        Value::Bool(Some(b)) => {
            if *b {
                "1".to_string()
            } else {
                String::new()
            }
        }
        Value::TinyInt(Some(v)) => v.to_string(),
        Value::SmallInt(Some(v)) => v.to_string(),
        Value::Int(Some(v)) => v.to_string(),
        Value::BigInt(Some(v)) => v.to_string(),
        Value::TinyUnsigned(Some(v)) => v.to_string(),
        Value::SmallUnsigned(Some(v)) => v.to_string(),
        Value::Unsigned(Some(v)) => v.to_string(),
        Value::BigUnsigned(Some(v)) => v.to_string(),
        Value::Float(Some(v)) => v.to_string(),
        Value::Double(Some(v)) => v.to_string(),
        Value::String(Some(s)) => s.clone(),
        Value::Char(Some(c)) => c.to_string(),
        other => match as_naive_date_time(other) {
            Some(dt) => dt.to_string(),
            None => format!("{other:?}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_nulls_are_null() {
        assert!(is_null(&Value::String(None)));
        assert!(is_null(&Value::Int(None)));
        assert!(is_null(&Value::Double(None)));
        assert!(is_null(&Value::ChronoDateTime(None)));
        assert!(is_null(&null()));
    }

    #[test]
    fn test_present_values_are_not_null() {
        assert!(!is_null(&Value::String(Some(String::new()))));
        assert!(!is_null(&Value::Int(Some(0))));
        assert!(!is_null(&Value::Bool(Some(false))));
    }

    #[test]
    fn test_as_i64_accepts_count_shapes() {
        assert_eq!(as_i64(&Value::BigInt(Some(7))), 7);
        assert_eq!(as_i64(&Value::Int(Some(3))), 3);
        assert_eq!(as_i64(&Value::String(Some(" 12 ".to_string()))), 12);
        // EDGE CASE: non-numeric and null values cast to zero
        assert_eq!(as_i64(&Value::String(Some("abc".to_string()))), 0);
        assert_eq!(as_i64(&Value::BigInt(None)), 0);
    }

    #[test]
    fn test_index_fragment_rendering() {
        assert_eq!(to_index_fragment(&Value::Int(Some(42))), "42");
        assert_eq!(to_index_fragment(&Value::String(Some("draft".to_string()))), "draft");
        assert_eq!(to_index_fragment(&Value::Bool(Some(true))), "1");
        assert_eq!(to_index_fragment(&Value::Bool(Some(false))), "");
        assert_eq!(to_index_fragment(&Value::String(None)), "");
    }

    #[test]
    fn test_date_widening() {
        let date = NaiveDate::from_ymd_opt(2018, 8, 28).unwrap();
        let value = Value::from(date);
        let dt = as_naive_date_time(&value).unwrap();
        assert_eq!(dt, date.and_hms_opt(0, 0, 0).unwrap());
    }
}
