//! Model layer: entity descriptions and records.
//!
//! - [`LifeEntity`]: static description of a table-backed model
//! - [`Record`]: one instance, with attributes, loaded relations and a count cache
//! - [`singular`]: table name inflection used for relation names and foreign keys

pub mod entity;
pub mod hydrate;
pub mod inflector;
pub mod record;

#[doc(inline)]
pub use entity::{LifeEntity, DEFAULT_DATE_FORMAT};
#[doc(inline)]
pub use hydrate::{relation_name_for_prefix, split_relations};
#[doc(inline)]
pub use inflector::singular;
#[doc(inline)]
pub use record::Record;
