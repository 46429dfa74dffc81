use super::{AttributeError, AttributeTransform, TransformContext};
use sea_query::Value;

/// Replaces empty and whitespace-only strings with null.
///
/// Scoped by [`ModelConfig::null_empty`](super::ModelConfig::null_empty).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmptyString;

impl NullEmptyString {
    pub fn should_null(ctx: &TransformContext<'_>, key: &str, value: &Value) -> bool {
        if !ctx.config.null_empty.applies_to(key) {
            return false;
        }
        match value {
            Value::String(Some(s)) => s.is_empty() || is_blank(s),
            _ => false,
        }
    }
}

// ASCII blanks plus NUL and vertical tab, and any Unicode whitespace
fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || c == '\0' || c == '\x0B')
}

impl AttributeTransform for NullEmptyString {
    fn name(&self) -> &'static str {
        "null_empty_string"
    }

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        key: &str,
        value: Value,
    ) -> Result<Value, AttributeError> {
        if Self::should_null(ctx, key, &value) {
            return Ok(crate::value::null());
        }
        Ok(value)
    }
}
