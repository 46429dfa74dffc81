//! `Record`: one model instance.

use super::hydrate::split_relations;
use super::LifeEntity;
use crate::attribute::{read_date, AttributeError, TransformContext};
use crate::relation::RelationCountCache;
use crate::value::{self, Attributes};
use chrono::NaiveDateTime;
use sea_query::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A model instance: attributes, loaded relations and the relation-count cache.
///
/// Writes through [`set_attribute`](Self::set_attribute) run the entity's
/// attribute pipeline. Rows coming back from the database go through
/// [`set_raw_attributes`](Self::set_raw_attributes) instead, which skips the
/// pipeline and hydrates `alias.column` keys into related records.
///
/// # Example
///
/// ```
/// use lifeguard_support::model::{LifeEntity, Record};
/// use sea_query::Value;
/// use std::sync::Arc;
///
/// struct Post;
///
/// impl LifeEntity for Post {
///     fn table_name(&self) -> &str {
///         "posts"
///     }
/// }
///
/// let mut post = Record::new(Arc::new(Post));
/// post.set_attribute("title", "   ")?;
/// post.set_attribute("body", "<p>Hello</p>")?;
///
/// assert_eq!(post.get_attribute("title"), Some(&Value::String(None)));
/// assert_eq!(post.get_attribute("body"), Some(&Value::from("Hello")));
/// # Ok::<(), lifeguard_support::attribute::AttributeError>(())
/// ```
#[derive(Clone)]
pub struct Record {
    entity: Arc<dyn LifeEntity>,
    attributes: Attributes,
    relations: BTreeMap<String, Option<Record>>,
    pub(crate) count_cache: RelationCountCache,
}

impl Record {
    pub fn new(entity: Arc<dyn LifeEntity>) -> Self {
        Self {
            entity,
            attributes: Attributes::new(),
            relations: BTreeMap::new(),
            count_cache: RelationCountCache::default(),
        }
    }

    /// Build a record from a fetched row, hydrating joined relations.
    pub fn from_row(entity: Arc<dyn LifeEntity>, attributes: Attributes) -> Self {
        let mut record = Self::new(entity);
        record.set_raw_attributes(attributes);
        record
    }

    pub fn entity(&self) -> &Arc<dyn LifeEntity> {
        &self.entity
    }

    pub fn table_name(&self) -> &str {
        self.entity.table_name()
    }

    /// Set an attribute through the entity's transform pipeline.
    ///
    /// Nothing is stored when a transform fails.
    ///
    /// # Errors
    ///
    /// Returns the first `AttributeError` raised by the pipeline.
    pub fn set_attribute<K, V>(&mut self, key: K, value: V) -> Result<&mut Self, AttributeError>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let key = key.into();
        let ctx = TransformContext {
            config: self.entity.model_config(),
            default_date_format: self.entity.date_format(),
        };
        let value = self.entity.pipeline().apply(&ctx, &key, value.into())?;
        self.attributes.insert(key, value);
        Ok(self)
    }

    /// `set_attribute` for each pair, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first `AttributeError`; earlier pairs stay written.
    pub fn fill<I, K, V>(&mut self, pairs: I) -> Result<&mut Self, AttributeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in pairs {
            self.set_attribute(key, value)?;
        }
        Ok(self)
    }

    /// Stored value, exactly as written.
    pub fn get_attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Value for reading: declared date attributes come back as timestamps.
    ///
    /// A stored date string that no longer parses is returned unchanged.
    pub fn get_attribute_value(&self, key: &str) -> Option<Value> {
        let stored = self.attributes.get(key)?;
        if !self.entity.model_config().is_date_attribute(key) || value::is_null(stored) {
            return Some(stored.clone());
        }
        match self.read_date(key, stored) {
            Some(dt) => Some(Value::from(dt)),
            None => {
                log::debug!(
                    "{}.{key}: stored date {stored:?} is not readable",
                    self.table_name()
                );
                Some(stored.clone())
            }
        }
    }

    /// Typed read of a date attribute.
    pub fn get_date(&self, key: &str) -> Option<NaiveDateTime> {
        let stored = self.attributes.get(key)?;
        self.read_date(key, stored)
    }

    fn read_date(&self, key: &str, stored: &Value) -> Option<NaiveDateTime> {
        let format = self
            .entity
            .model_config()
            .date_format_for(key, self.entity.date_format());
        read_date(stored, format)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Replace all attributes without running the pipeline.
    ///
    /// Keys shaped `prefix.column` whose prefix resolves to a relation of the
    /// entity are removed and turned into that relation; see
    /// [`split_relations`](super::hydrate::split_relations).
    pub fn set_raw_attributes(&mut self, attributes: Attributes) {
        let (attributes, relations) = split_relations(self.entity.as_ref(), attributes);
        for (name, related) in relations {
            self.relations.insert(name, related);
        }
        self.attributes = attributes;
    }

    /// Primary key value, or null when unset.
    pub fn key(&self) -> Value {
        self.attributes
            .get(self.entity.primary_key())
            .cloned()
            .unwrap_or_else(value::null)
    }

    pub fn set_relation(&mut self, name: impl Into<String>, related: Option<Record>) {
        self.relations.insert(name.into(), related);
    }

    /// Loaded related record. `None` both when not loaded and when loaded empty;
    /// use [`relation_loaded`](Self::relation_loaded) to tell them apart.
    pub fn relation(&self, name: &str) -> Option<&Record> {
        self.relations.get(name).and_then(Option::as_ref)
    }

    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn relations(&self) -> &BTreeMap<String, Option<Record>> {
        &self.relations
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.entity.table_name())
            .field("attributes", &self.attributes)
            .field("relations", &self.relations)
            .field("count_cache", &self.count_cache)
            .finish()
    }
}
