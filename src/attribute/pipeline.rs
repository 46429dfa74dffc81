//! Ordered attribute transform pipeline.
//!
//! A [`Record`](crate::model::Record) runs its entity's pipeline on every
//! `set_attribute` call. Transforms run in insertion order, each receiving the
//! previous transform's output; the first error aborts the write.

use super::{AttributeError, CleanHtml, DateAttribute, ModelConfig, NormalizeFloat, NullEmptyString};
use sea_query::Value;

/// Model settings a transform may consult.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub config: &'a ModelConfig,
    /// Model default output pattern for date attributes
    pub default_date_format: &'a str,
}

/// A single `(key, value) -> value` transform.
///
/// Implementations must leave the value untouched when their activation
/// predicate does not hold.
pub trait AttributeTransform: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns `AttributeError` when the value cannot be transformed.
    fn apply(&self, ctx: &TransformContext<'_>, key: &str, value: Value)
        -> Result<Value, AttributeError>;
}

#[derive(Default)]
pub struct AttributePipeline {
    transforms: Vec<Box<dyn AttributeTransform>>,
}

impl AttributePipeline {
    /// Empty pipeline: values are stored as given.
    pub fn new() -> Self {
        Self::default()
    }

    /// trim-to-null, HTML strip, date normalize, float normalize.
    ///
    /// The blank check runs before markup is removed, so a value that is only
    /// markup or whitespace inside markup is stored as what remains: `"<br>"`
    /// becomes `""` and `"<p> </p>"` becomes `" "`, not null. Build a pipeline
    /// with `CleanHtml` first to null those as well.
    pub fn standard() -> Self {
        Self::new()
            .with(NullEmptyString)
            .with(CleanHtml)
            .with(DateAttribute)
            .with(NormalizeFloat)
    }

    pub fn with<T: AttributeTransform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Run every transform over `value`.
    ///
    /// # Errors
    ///
    /// Returns the first transform error; later transforms do not run.
    pub fn apply(
        &self,
        ctx: &TransformContext<'_>,
        key: &str,
        value: Value,
    ) -> Result<Value, AttributeError> {
        self.transforms
            .iter()
            .try_fold(value, |value, transform| transform.apply(ctx, key, value))
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for AttributePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributePipeline")
            .field("transforms", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl AttributeTransform for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn apply(
            &self,
            _ctx: &TransformContext<'_>,
            _key: &str,
            value: Value,
        ) -> Result<Value, AttributeError> {
            Ok(match value {
                Value::String(Some(s)) => Value::String(Some(s.to_uppercase())),
                other => other,
            })
        }
    }

    fn ctx(config: &ModelConfig) -> TransformContext<'_> {
        TransformContext {
            config,
            default_date_format: "%Y-%m-%d %H:%M:%S",
        }
    }

    #[test]
    fn test_standard_order() {
        let pipeline = AttributePipeline::standard();
        assert_eq!(
            pipeline.names(),
            vec!["null_empty_string", "clean_html", "date_attribute", "normalize_float"]
        );
    }

    #[test]
    fn test_standard_strips_after_blank_check() {
        let config = ModelConfig::default();
        let pipeline = AttributePipeline::standard();
        let value = pipeline.apply(&ctx(&config), "body", Value::from("<p> </p>")).unwrap();
        assert_eq!(value, Value::from(" "));

        let strip_first = AttributePipeline::new()
            .with(CleanHtml)
            .with(NullEmptyString);
        let value = strip_first.apply(&ctx(&config), "body", Value::from("<p> </p>")).unwrap();
        assert_eq!(value, Value::String(None));
    }

    #[test]
    fn test_empty_pipeline_passes_through() {
        let config = ModelConfig::default();
        let pipeline = AttributePipeline::new();
        assert!(pipeline.is_empty());
        let value = pipeline
            .apply(&ctx(&config), "title", Value::from("  "))
            .unwrap();
        assert_eq!(value, Value::from("  "));
    }

    #[test]
    fn test_custom_transform_runs_after_standard() {
        let config = ModelConfig::default();
        let pipeline = AttributePipeline::standard().with(Upper);
        assert_eq!(pipeline.len(), 5);
        let value = pipeline
            .apply(&ctx(&config), "title", Value::from("<b>hi</b>"))
            .unwrap();
        assert_eq!(value, Value::from("HI"));
    }

    #[test]
    fn test_error_stops_pipeline() {
        let config = ModelConfig {
            date_attributes: vec!["published_at".to_string()],
            ..ModelConfig::default()
        };
        let pipeline = AttributePipeline::standard().with(Upper);
        let result = pipeline.apply(&ctx(&config), "published_at", Value::from("not a date"));
        assert!(matches!(result, Err(AttributeError::InvalidDate { .. })));
    }
}
