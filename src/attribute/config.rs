//! Per-model attribute configuration.
//!
//! Every field is optional. An absent filter applies a transform to every
//! attribute; a present but empty `include_only` list applies it to none.
//!
//! # Example
//!
//! ```
//! use lifeguard_support::attribute::{AttributeFilter, DateFormats, ModelConfig};
//!
//! let config = ModelConfig {
//!     null_empty: AttributeFilter::except(["title"]),
//!     date_attributes: vec!["published_at".to_string()],
//!     date_formats: Some(DateFormats::Global("%d.%m.%Y".to_string())),
//!     normalize_float_attributes: vec!["price".to_string()],
//!     ..ModelConfig::default()
//! };
//! assert!(!config.null_empty.applies_to("title"));
//! assert_eq!(config.date_format_for("published_at", "%Y-%m-%d"), "%d.%m.%Y");
//! ```

use serde::Deserialize;
use std::collections::HashMap;

/// Allow-list / deny-list pair scoping a transform to attribute keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttributeFilter {
    /// When set, only these keys are transformed
    pub include_only: Option<Vec<String>>,
    /// When set, these keys are never transformed
    pub exclude: Option<Vec<String>>,
}

impl AttributeFilter {
    /// Filter that applies to every attribute.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include_only: Some(keys.into_iter().map(Into::into).collect()),
            exclude: None,
        }
    }

    pub fn except<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include_only: None,
            exclude: Some(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Returns `true` if the transform should run for `key`.
    pub fn applies_to(&self, key: &str) -> bool {
        if let Some(include) = &self.include_only {
            if !include.iter().any(|k| k == key) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.iter().any(|k| k == key) {
                return false;
            }
        }
        true
    }
}

/// Output pattern(s) for date attributes, in chrono strftime syntax.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DateFormats {
    /// One pattern for every date attribute
    Global(String),
    /// Pattern per attribute; unlisted attributes use the model default
    PerAttribute(HashMap<String, String>),
}

/// Attribute and relation settings for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub null_empty: AttributeFilter,
    pub clean_html: AttributeFilter,
    /// Tag names kept by the HTML strip (`b` or `<b>`)
    pub allowed_html_tags: Option<Vec<String>>,
    pub date_attributes: Vec<String>,
    pub date_formats: Option<DateFormats>,
    pub normalize_float_attributes: Vec<String>,
    /// Join prefix to relation name, for prefixes that do not singularize to it
    pub relation_aliases: HashMap<String, String>,
}

impl ModelConfig {
    pub fn is_date_attribute(&self, key: &str) -> bool {
        self.date_attributes.iter().any(|k| k == key)
    }

    pub fn is_float_attribute(&self, key: &str) -> bool {
        self.normalize_float_attributes.iter().any(|k| k == key)
    }

    /// Output pattern for a date attribute, falling back to `default`.
    pub fn date_format_for<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match &self.date_formats {
            Some(DateFormats::Global(format)) => format,
            Some(DateFormats::PerAttribute(formats)) => {
                formats.get(key).map(String::as_str).unwrap_or(default)
            }
            None => default,
        }
    }

    pub fn relation_alias(&self, prefix: &str) -> Option<&str> {
        self.relation_aliases.get(prefix).map(String::as_str)
    }
}
