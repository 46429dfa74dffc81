//! `LifeEntity` trait: static description of a model type.

use crate::attribute::{AttributePipeline, ModelConfig};
use crate::relation::RelationDef;
use once_cell::sync::Lazy;

/// Default persistence format for date attributes.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static EMPTY_MODEL_CONFIG: Lazy<ModelConfig> = Lazy::new(ModelConfig::default);
static STANDARD_PIPELINE: Lazy<AttributePipeline> = Lazy::new(AttributePipeline::standard);

/// Describes a table-backed model: its table, keys, attribute configuration and
/// named relations.
///
/// Only `table_name` is required. Everything else has a default matching the
/// usual conventions (`id` primary key, `{singular table}_id` foreign key, the
/// standard attribute pipeline and an empty configuration).
///
/// # Example
///
/// ```
/// use lifeguard_support::attribute::ModelConfig;
/// use lifeguard_support::model::LifeEntity;
/// use lifeguard_support::relation::RelationDef;
/// use once_cell::sync::Lazy;
/// use std::sync::Arc;
///
/// struct User;
///
/// impl LifeEntity for User {
///     fn table_name(&self) -> &str {
///         "users"
///     }
/// }
///
/// struct Post;
///
/// static POST_CONFIG: Lazy<ModelConfig> = Lazy::new(|| ModelConfig {
///     normalize_float_attributes: vec!["rating".to_string()],
///     ..ModelConfig::default()
/// });
///
/// impl LifeEntity for Post {
///     fn table_name(&self) -> &str {
///         "posts"
///     }
///
///     fn model_config(&self) -> &ModelConfig {
///         &POST_CONFIG
///     }
///
///     fn relation(&self, name: &str) -> Option<RelationDef> {
///         match name {
///             "user" => Some(RelationDef::belongs_to(self, Arc::new(User))),
///             _ => None,
///         }
///     }
/// }
///
/// assert_eq!(User.foreign_key(), "user_id");
/// assert!(Post.relation("user").is_some());
/// ```
pub trait LifeEntity: Send + Sync {
    fn table_name(&self) -> &str;

    fn primary_key(&self) -> &str {
        "id"
    }

    /// strftime pattern used for date attributes without a configured format
    fn date_format(&self) -> &str {
        DEFAULT_DATE_FORMAT
    }

    fn model_config(&self) -> &ModelConfig {
        &EMPTY_MODEL_CONFIG
    }

    /// Transforms applied on every attribute write
    fn pipeline(&self) -> &AttributePipeline {
        &STANDARD_PIPELINE
    }

    /// Relation accessor registry. `None` means no relation of that name.
    fn relation(&self, _name: &str) -> Option<RelationDef> {
        None
    }

    /// Column other tables use to reference this model.
    fn foreign_key(&self) -> String {
        format!(
            "{}_{}",
            super::singular(self.table_name()),
            self.primary_key()
        )
    }
}
