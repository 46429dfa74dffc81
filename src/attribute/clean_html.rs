use super::{AttributeError, AttributeTransform, TransformContext};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sea_query::Value;

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

// Declarations (`<!DOCTYPE>`, `<?xml?>`) or element tags. Quoted attribute
// values may contain `>`. A tag left open at the end of input runs to the end.
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<[!?][^>]*(?:>|$)|</?([A-Za-z][A-Za-z0-9-]*)\b(?:"[^"]*(?:"|$)|'[^']*(?:'|$)|[^'">])*(?:>|$)"#,
    )
    .expect("tag pattern is valid")
});

/// Strips HTML tags and comments from string attributes.
///
/// Scoped by [`ModelConfig::clean_html`](super::ModelConfig::clean_html); tags listed
/// in `allowed_html_tags` survive.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanHtml;

impl AttributeTransform for CleanHtml {
    fn name(&self) -> &'static str {
        "clean_html"
    }

    fn apply(
        &self,
        ctx: &TransformContext<'_>,
        key: &str,
        value: Value,
    ) -> Result<Value, AttributeError> {
        if !ctx.config.clean_html.applies_to(key) {
            return Ok(value);
        }
        match value {
            Value::String(Some(s)) => {
                let allowed = ctx.config.allowed_html_tags.as_deref().unwrap_or(&[]);
                Ok(Value::String(Some(strip_tags(&s, allowed))))
            }
            other => Ok(other),
        }
    }
}

/// Remove markup from `input`, keeping tags whose name is in `allowed`.
///
/// Allowed entries may be bare names (`b`) or tag strings (`<b>`, `<b><i>`).
/// Text between tags is left as is. Comments, declarations and a tag left
/// unterminated at the end of the input are always removed.
///
/// ```
/// use lifeguard_support::attribute::strip_tags;
///
/// assert_eq!(strip_tags("<p>Hello <b>you</b></p>", &[]), "Hello you");
/// assert_eq!(strip_tags("<p>Hello <b>you</b></p>", &["<b>".to_string()]), "Hello <b>you</b>");
/// ```
pub fn strip_tags(input: &str, allowed: &[String]) -> String {
    if !input.contains('<') {
        return input.to_string();
    }
    let allowed = allowed_names(allowed);
    let without_comments = COMMENT_RE.replace_all(input, "");
    TAG_RE
        .replace_all(&without_comments, |caps: &Captures<'_>| {
            let keep = caps[0].ends_with('>')
                && caps
                    .get(1)
                    .map(|name| name.as_str().to_ascii_lowercase())
                    .is_some_and(|name| allowed.iter().any(|a| *a == name));
            if keep {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

fn allowed_names(allowed: &[String]) -> Vec<String> {
    allowed
        .iter()
        .flat_map(|entry| {
            entry
                .split(|c: char| matches!(c, '<' | '>' | '/' | ',') || c.is_whitespace())
                .filter(|name| !name.is_empty())
                .map(str::to_ascii_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeFilter, ModelConfig};

    fn run(config: &ModelConfig, key: &str, value: Value) -> Value {
        let ctx = TransformContext {
            config,
            default_date_format: "%Y-%m-%d",
        };
        CleanHtml.apply(&ctx, key, value).unwrap()
    }

    #[test]
    fn test_strips_tags_and_comments() {
        assert_eq!(strip_tags("<div class=\"a\">Text</div>", &[]), "Text");
        assert_eq!(strip_tags("a<!-- hidden <b> -->b", &[]), "ab");
        assert_eq!(strip_tags("line<br/>break", &[]), "linebreak");
        assert_eq!(strip_tags("plain text", &[]), "plain text");
    }

    #[test]
    fn test_keeps_allowed_tags() {
        let allowed = vec!["<b><i>".to_string(), "A".to_string()];
        assert_eq!(
            strip_tags("<p><b>bold</b> <i>it</i> <a href=\"#\">x</a></p>", &allowed),
            "<b>bold</b> <i>it</i> <a href=\"#\">x</a>"
        );
    }

    #[test]
    fn test_allowed_name_is_not_a_prefix_match() {
        // EDGE CASE: allowing <b> must not keep <blockquote>
        let allowed = vec!["b".to_string()];
        assert_eq!(strip_tags("<blockquote>q</blockquote>", &allowed), "q");
    }

    #[test]
    fn test_quoted_attribute_may_contain_gt() {
        assert_eq!(strip_tags("<a title=\"x>y\">t</a>", &[]), "t");
        assert_eq!(strip_tags("<img alt='a > b'>pic", &[]), "pic");
    }

    #[test]
    fn test_strips_declarations_and_processing_instructions() {
        assert_eq!(strip_tags("<!DOCTYPE html><p>hi</p>", &[]), "hi");
        assert_eq!(strip_tags("<?xml version=\"1.0\"?>doc", &[]), "doc");
    }

    #[test]
    fn test_unterminated_tag_is_dropped() {
        // EDGE CASE: an open tag at the end swallows the rest of the input
        assert_eq!(strip_tags("a <b", &[]), "a ");
        assert_eq!(strip_tags("x <a href=\"y>z", &[]), "x ");
        let allowed = vec!["b".to_string()];
        assert_eq!(strip_tags("<b>ok</b> <b", &allowed), "<b>ok</b> ");
    }

    #[test]
    fn test_comparison_text_is_not_a_tag() {
        assert_eq!(strip_tags("1 < 2 and 3 > 2", &[]), "1 < 2 and 3 > 2");
    }

    #[test]
    fn test_transform_respects_filters_and_types() {
        let config = ModelConfig {
            clean_html: AttributeFilter::except(["body"]),
            allowed_html_tags: Some(vec!["b".to_string()]),
            ..ModelConfig::default()
        };
        assert_eq!(run(&config, "body", Value::from("<i>x</i>")), Value::from("<i>x</i>"));
        assert_eq!(run(&config, "title", Value::from("<i><b>x</b></i>")), Value::from("<b>x</b>"));
        assert_eq!(run(&config, "title", Value::Int(Some(5))), Value::Int(Some(5)));
    }
}
