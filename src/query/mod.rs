//! Query building and execution.
//!
//! - **Select**: [`SelectQuery`], an entity-bound select that loads [`Record`](crate::model::Record)s
//! - **Schema**: [`SchemaIntrospector`] column listings used by joins that select every column
//! - **Value Conversion**: `sea_query::Value` to `ToSql` parameters, and rows back to attributes

pub mod schema;
pub mod select;
pub mod value_conversion;

#[doc(inline)]
pub use schema::{InformationSchema, SchemaIntrospector, StaticSchema};
#[doc(inline)]
pub use select::SelectQuery;
