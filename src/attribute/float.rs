use super::{AttributeError, AttributeTransform, TransformContext};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::Value;

static NUMERIC_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("numeric prefix pattern is valid")
});

/// Converts attributes listed in `ModelConfig::normalize_float_attributes` to doubles,
/// accepting a decimal comma.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeFloat;

impl AttributeTransform for NormalizeFloat {
    fn name(&self) -> &'static str {
        "normalize_float"
    }

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        key: &str,
        value: Value,
    ) -> Result<Value, AttributeError> {
        if !ctx.config.is_float_attribute(key) || crate::value::is_null(&value) {
            return Ok(value);
        }
        let normalized = match value {
            Value::String(Some(s)) => normalize_float(&s),
            Value::Float(Some(f)) => f64::from(f),
            Value::Double(Some(d)) => d,
            Value::Bool(Some(b)) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::TinyInt(Some(i)) => f64::from(i),
            Value::SmallInt(Some(i)) => f64::from(i),
            Value::Int(Some(i)) => f64::from(i),
            Value::BigInt(Some(i)) => i as f64,
            Value::TinyUnsigned(Some(u)) => f64::from(u),
            Value::SmallUnsigned(Some(u)) => f64::from(u),
            Value::Unsigned(Some(u)) => f64::from(u),
            Value::BigUnsigned(Some(u)) => u as f64,
            other => {
                log::debug!("normalize_float: leaving non-scalar value of '{key}' unchanged");
                return Ok(other);
            }
        };
        Ok(Value::Double(Some(normalized)))
    }
}

/// Parse a decimal-comma or decimal-point number.
///
/// Only the leading numeric part is read (`"12,5 kg"` is `12.5`). Input with no
/// numeric prefix is `0.0`.
///
/// ```
/// use lifeguard_support::attribute::normalize_float;
///
/// assert_eq!(normalize_float("1,23"), 1.23);
/// assert_eq!(normalize_float("abc"), 0.0);
/// ```
pub fn normalize_float(input: &str) -> f64 {
    let replaced = input.replace(',', ".");
    let parsed = NUMERIC_PREFIX_RE
        .find(&replaced)
        .and_then(|m| m.as_str().trim_start().parse::<f64>().ok());
    match parsed {
        Some(value) => value,
        None => {
            log::debug!("normalize_float: '{input}' has no numeric prefix, using 0");
            0.0
        }
    }
}
