//! # Lifeguard Support
//!
//! Model support utilities for Lifeguard on `may_postgres`:
//!
//! - **Attribute transforms** ([`attribute`]): every attribute write runs a pipeline that
//!   nulls blank strings, strips HTML, normalizes declared date attributes and parses
//!   declared float attributes with a decimal comma.
//! - **Relation counts** ([`relation::count`]): `SELECT fk, COUNT(fk)` lookups cached per
//!   record, so repeated counts for the same relation cost one query.
//! - **Relation joins** ([`relation::join`]): joins a named relation under an alias,
//!   projects `alias.column` labels and hydrates them back into related records.
//!
//! Statements are built with `sea_query` and run through a [`LifeExecutor`].

pub mod attribute;
pub mod config;
pub mod executor;
pub mod metrics;
pub mod model;
pub mod query;
pub mod relation;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod value;

pub use attribute::{AttributeError, AttributePipeline, AttributeTransform, ModelConfig};
pub use self::config::{DatabaseConfig, SupportConfig};
pub use executor::{LifeError, LifeExecutor, MayPostgresExecutor};
pub use model::{LifeEntity, Record};
pub use query::{SchemaIntrospector, SelectQuery};
pub use relation::{
    CountFilter, CountTarget, JoinColumns, JoinOptions, RelationDef, RelationError, RelationType,
};
pub use value::Attributes;
