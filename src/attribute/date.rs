//! Date attribute normalization.
//!
//! Declared date attributes accept loosely formatted strings (`28. 08. 2018`,
//! `2018-08-28T10:00:00+02:00`, `08/28/2018`) and are stored as strings in the
//! attribute's output pattern. Reading them back through
//! [`Record::get_attribute_value`](crate::model::Record::get_attribute_value) yields a
//! structured timestamp again.

use super::{AttributeError, AttributeTransform, TransformContext};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::Value;
use std::fmt::Write as _;

static SEPARATOR_SPACING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([./\-:])\s*").expect("separator pattern is valid"));

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Slashes are month-first, dots and dashes day-first
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d-%m-%Y", "%m/%d/%Y"];

/// Parses and reformats attributes listed in `ModelConfig::date_attributes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateAttribute;

impl AttributeTransform for DateAttribute {
    fn name(&self) -> &'static str {
        "date_attribute"
    }

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        key: &str,
        value: Value,
    ) -> Result<Value, AttributeError> {
        if !ctx.config.is_date_attribute(key) || crate::value::is_null(&value) {
            return Ok(value);
        }
        let format = ctx.config.date_format_for(key, ctx.default_date_format);

        let parsed = match &value {
            Value::String(Some(s)) if s.is_empty() => return Ok(value),
            Value::String(Some(s)) => {
                parse_date(s).map_err(|source| AttributeError::InvalidDate {
                    attribute: key.to_string(),
                    value: s.clone(),
                    source,
                })?
            }
            other => match crate::value::as_naive_date_time(other) {
                Some(dt) => dt,
                None => return Ok(value),
            },
        };

        let formatted = format_date(&parsed, format).ok_or_else(|| {
            AttributeError::InvalidDateFormat {
                attribute: key.to_string(),
                format: format.to_string(),
            }
        })?;
        Ok(Value::String(Some(formatted)))
    }
}

/// Parse a loosely formatted date or timestamp.
///
/// Whitespace around `.`, `/`, `-` and `:` is dropped first, so `28. 08. 2018`
/// and `28.08.2018` are the same input. RFC 3339 timestamps keep their
/// wall-clock time. Date-only inputs resolve to midnight.
///
/// # Errors
///
/// Returns the parse error of the first attempted pattern when nothing matches.
pub fn parse_date(input: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let normalized = SEPARATOR_SPACING_RE.replace_all(input.trim(), "$1");
    let normalized = normalized.as_ref();

    let first_error = match DateTime::parse_from_rfc3339(normalized) {
        Ok(dt) => return Ok(dt.naive_local()),
        Err(e) => e,
    };

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(normalized, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(normalized, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    Err(first_error)
}

/// Format `dt` with a strftime pattern; `None` when the pattern is invalid.
pub fn format_date(dt: &NaiveDateTime, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", dt.format(format)).ok()?;
    Some(out)
}

/// Turn a stored date attribute back into a timestamp.
///
/// Tries the attribute's output pattern first (as a timestamp, then as a date)
/// and falls back to the tolerant parser.
pub fn read_date(value: &Value, format: &str) -> Option<NaiveDateTime> {
    match value {
        Value::String(Some(s)) if !s.is_empty() => NaiveDateTime::parse_from_str(s, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, format)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
            .or_else(|| parse_date(s).ok()),
        other => crate::value::as_naive_date_time(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{DateFormats, ModelConfig};
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    fn config() -> ModelConfig {
        ModelConfig {
            date_attributes: vec!["published_at".to_string()],
            ..ModelConfig::default()
        }
    }

    fn run(config: &ModelConfig, key: &str, value: Value) -> Result<Value, AttributeError> {
        let ctx = TransformContext {
            config,
            default_date_format: "%Y-%m-%d %H:%M:%S",
        };
        DateAttribute.apply(&ctx, key, value)
    }

    #[test]
    fn test_spaced_and_compact_dates_agree() {
        assert_eq!(parse_date("28. 08. 2018").unwrap(), date(2018, 8, 28));
        assert_eq!(parse_date("28.08.2018").unwrap(), date(2018, 8, 28));
        assert_eq!(parse_date("2018 - 08 - 28").unwrap(), date(2018, 8, 28));
    }

    #[test]
    fn test_common_patterns() {
        let expected = date(2018, 8, 28).date().and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(parse_date("2018-08-28 10:30:00").unwrap(), expected);
        assert_eq!(parse_date("2018-08-28T10:30:00").unwrap(), expected);
        assert_eq!(parse_date("2018-08-28T10:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_date("28.08.2018 10:30").unwrap(), expected);
        assert_eq!(parse_date("08/28/2018").unwrap(), date(2018, 8, 28));
    }

    #[test]
    fn test_unparseable_is_error() {
        assert!(parse_date("yesterday-ish").is_err());
        let err = run(&config(), "published_at", Value::from("not a date")).unwrap_err();
        assert!(matches!(err, AttributeError::InvalidDate { .. }));
    }

    #[test]
    fn test_transform_formats_with_model_default() {
        let value = run(&config(), "published_at", Value::from("28. 08. 2018")).unwrap();
        assert_eq!(value, Value::from("2018-08-28 00:00:00"));
    }

    #[test]
    fn test_global_and_per_attribute_formats() {
        let mut cfg = config();
        cfg.date_formats = Some(DateFormats::Global("%d.%m.%Y".to_string()));
        let value = run(&cfg, "published_at", Value::from("2018-08-28")).unwrap();
        assert_eq!(value, Value::from("28.08.2018"));

        let mut per = HashMap::new();
        per.insert("published_at".to_string(), "%Y/%m/%d".to_string());
        cfg.date_formats = Some(DateFormats::PerAttribute(per));
        let value = run(&cfg, "published_at", Value::from("28.08.2018")).unwrap();
        assert_eq!(value, Value::from("2018/08/28"));
    }

    #[test]
    fn test_structured_dates_are_reformatted() {
        let value = run(&config(), "published_at", Value::from(date(2018, 8, 28))).unwrap();
        assert_eq!(value, Value::from("2018-08-28 00:00:00"));
    }

    #[test]
    fn test_passthrough_cases() {
        let cfg = config();
        // undeclared attribute
        assert_eq!(run(&cfg, "title", Value::from("28.08.2018")).unwrap(), Value::from("28.08.2018"));
        // EDGE CASE: null and empty string are left alone
        assert_eq!(run(&cfg, "published_at", Value::String(None)).unwrap(), Value::String(None));
        assert_eq!(run(&cfg, "published_at", Value::from("")).unwrap(), Value::from(""));
        // non-date scalars
        assert_eq!(run(&cfg, "published_at", Value::Int(Some(1))).unwrap(), Value::Int(Some(1)));
    }

    #[test]
    fn test_invalid_output_pattern_is_error() {
        let mut cfg = config();
        cfg.date_formats = Some(DateFormats::Global("%Q".to_string()));
        let err = run(&cfg, "published_at", Value::from("2018-08-28")).unwrap_err();
        assert!(matches!(err, AttributeError::InvalidDateFormat { .. }));
    }

    #[test]
    fn test_read_date_uses_output_pattern() {
        assert_eq!(read_date(&Value::from("28.08.2018"), "%d.%m.%Y"), Some(date(2018, 8, 28)));
        assert_eq!(
            read_date(&Value::from("2018-08-28 00:00:00"), "%Y-%m-%d %H:%M:%S"),
            Some(date(2018, 8, 28))
        );
        assert_eq!(read_date(&Value::String(None), "%Y"), None);
    }
}
