//! Relations between entities.
//!
//! - [`RelationDef`]: has-one, has-many and belongs-to definitions with extra conditions
//! - [`count`]: cached relation counts on a [`Record`](crate::model::Record)
//! - [`join`]: aliased relation joins on a [`SelectQuery`](crate::query::SelectQuery)

pub mod count;
pub mod def;
pub mod join;

#[doc(inline)]
pub use count::{count_from_row, CountFilter, CountTarget, RelationCountCache};
#[doc(inline)]
pub use def::{alias_column, column_expr, RelationDef, RelationType, RelationWhere};
#[doc(inline)]
pub use join::{JoinClause, JoinColumns, JoinOptions};

use crate::executor::LifeError;
use std::fmt;

/// Errors from relation counting and joining.
#[derive(Debug)]
pub enum RelationError {
    /// The entity defines no relation with this name
    UnknownRelation { entity: String, relation: String },
    /// Query or introspection failure
    Executor(LifeError),
}

impl fmt::Display for RelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationError::UnknownRelation { entity, relation } => {
                write!(f, "Unknown relation '{relation}' on {entity}")
            }
            RelationError::Executor(e) => write!(f, "Relation query failed: {e}"),
        }
    }
}

impl std::error::Error for RelationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelationError::Executor(e) => Some(e),
            RelationError::UnknownRelation { .. } => None,
        }
    }
}

impl From<LifeError> for RelationError {
    fn from(err: LifeError) -> Self {
        RelationError::Executor(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display() {
        let err = RelationError::UnknownRelation {
            entity: "users".to_string(),
            relation: "pets".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown relation 'pets' on users");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_from_life_error_keeps_source() {
        let err: RelationError = LifeError::QueryError("boom".to_string()).into();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("boom"));
    }
}
