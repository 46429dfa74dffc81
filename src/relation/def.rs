//! RelationDef struct for storing relationship metadata
//!
//! A `RelationDef` says how a parent entity reaches a related entity: the key
//! columns on both sides and any extra conditions declared on the relation. The
//! count cache turns it into a `WHERE` clause and the join rewriter into an `ON`
//! clause under an alias.

use crate::model::LifeEntity;
use crate::value::null;
use sea_query::{Alias, BinOper, Expr, ExprTrait};
use sea_query::Value;
use std::fmt;
use std::sync::Arc;

/// Type of relationship between entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// One-to-one relationship
    HasOne,
    /// One-to-many relationship
    HasMany,
    /// Many-to-one relationship (belongs_to)
    BelongsTo,
}

impl RelationType {
    /// Whether the foreign key lives on the related table.
    pub fn is_has_one_or_many(self) -> bool {
        matches!(self, RelationType::HasOne | RelationType::HasMany)
    }
}

/// A filter predicate attached to a relation.
///
/// Columns are either bare (`active`) or qualified (`comments.active`).
#[derive(Debug, Clone, PartialEq)]
pub enum RelationWhere {
    Basic {
        column: String,
        operator: BinOper,
        value: Value,
    },
    Null {
        column: String,
    },
    NotNull {
        column: String,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
}

impl RelationWhere {
    pub fn column(&self) -> &str {
        match self {
            RelationWhere::Basic { column, .. }
            | RelationWhere::Null { column }
            | RelationWhere::NotNull { column }
            | RelationWhere::In { column, .. } => column,
        }
    }

    /// Bound values, in placeholder order.
    pub fn bindings(&self) -> Vec<Value> {
        match self {
            RelationWhere::Basic { value, .. } => vec![value.clone()],
            RelationWhere::In { values, .. } => values.clone(),
            RelationWhere::Null { .. } | RelationWhere::NotNull { .. } => Vec::new(),
        }
    }

    /// Same predicate pointed at `alias` instead of `table`.
    ///
    /// `table.column` becomes `alias.column` and bare columns are qualified with
    /// the alias. Columns qualified with some other table are kept.
    pub fn aliased(&self, table: &str, alias: &str) -> Self {
        let column = alias_column(self.column(), table, alias);
        let mut aliased = self.clone();
        match &mut aliased {
            RelationWhere::Basic { column: c, .. }
            | RelationWhere::Null { column: c }
            | RelationWhere::NotNull { column: c }
            | RelationWhere::In { column: c, .. } => *c = column,
        }
        aliased
    }

    pub fn to_expr(&self) -> Expr {
        match self {
            RelationWhere::Basic {
                column,
                operator,
                value,
            } => column_expr(column).binary(*operator, value.clone()),
            RelationWhere::Null { column } => column_expr(column).is_null(),
            RelationWhere::NotNull { column } => column_expr(column).is_not_null(),
            RelationWhere::In { column, values } => {
                column_expr(column).is_in(values.iter().cloned())
            }
        }
    }
}

/// Rewrite a possibly qualified column from `table` to `alias`.
pub fn alias_column(column: &str, table: &str, alias: &str) -> String {
    match column.split_once('.') {
        Some((t, c)) if t == table => format!("{alias}.{c}"),
        Some(_) => column.to_string(),
        None => format!("{alias}.{column}"),
    }
}

/// Column expression for `column` or `table.column`.
pub fn column_expr(column: &str) -> Expr {
    match column.split_once('.') {
        Some((table, column)) => Expr::col((Alias::new(table), Alias::new(column))),
        None => Expr::col(Alias::new(column)),
    }
}

/// Defines a relationship between two entities
///
/// The `ON` clause is always `from_tbl.from_col = to_tbl.to_col`:
///
/// | type | `from_col` | `to_col` |
/// |------|------------|----------|
/// | `HasOne` / `HasMany` | parent local key | foreign key on related |
/// | `BelongsTo` | foreign key on parent | owner key on related |
///
/// # Example
///
/// ```
/// use lifeguard_support::model::LifeEntity;
/// use lifeguard_support::relation::{RelationDef, RelationType};
/// use std::sync::Arc;
///
/// struct User;
/// impl LifeEntity for User {
///     fn table_name(&self) -> &str { "users" }
/// }
///
/// struct Comment;
/// impl LifeEntity for Comment {
///     fn table_name(&self) -> &str { "comments" }
/// }
///
/// let rel = RelationDef::has_many(&User, Arc::new(Comment)).where_eq("approved", true);
/// assert_eq!(rel.rel_type, RelationType::HasMany);
/// assert_eq!(rel.to_col, "user_id");
/// assert_eq!(rel.query_wheres(1.into()).len(), 3);
/// ```
#[derive(Clone)]
pub struct RelationDef {
    /// Type of relationship
    pub rel_type: RelationType,
    /// Parent table
    pub from_tbl: String,
    /// Related table
    pub to_tbl: String,
    pub from_col: String,
    pub to_col: String,
    /// Related entity, used to build related records
    pub related: Arc<dyn LifeEntity>,
    /// Conditions declared on the relation, after the key constraints
    pub conditions: Vec<RelationWhere>,
}

impl fmt::Debug for RelationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationDef")
            .field("rel_type", &self.rel_type)
            .field("from_tbl", &self.from_tbl)
            .field("to_tbl", &self.to_tbl)
            .field("from_col", &self.from_col)
            .field("to_col", &self.to_col)
            .field("related", &self.related.table_name())
            .field("conditions", &self.conditions)
            .finish()
    }
}

impl RelationDef {
    /// `parent` has one `related`, keyed by `{singular parent table}_id` on the related table.
    pub fn has_one(parent: &dyn LifeEntity, related: Arc<dyn LifeEntity>) -> Self {
        Self::has(RelationType::HasOne, parent, related)
    }

    /// `parent` has many `related`, keyed by `{singular parent table}_id` on the related table.
    pub fn has_many(parent: &dyn LifeEntity, related: Arc<dyn LifeEntity>) -> Self {
        Self::has(RelationType::HasMany, parent, related)
    }

    fn has(rel_type: RelationType, parent: &dyn LifeEntity, related: Arc<dyn LifeEntity>) -> Self {
        Self {
            rel_type,
            from_tbl: parent.table_name().to_string(),
            to_tbl: related.table_name().to_string(),
            from_col: parent.primary_key().to_string(),
            to_col: parent.foreign_key(),
            related,
            conditions: Vec::new(),
        }
    }

    /// `parent` belongs to `related` through `{singular related table}_id` on the parent.
    pub fn belongs_to(parent: &dyn LifeEntity, related: Arc<dyn LifeEntity>) -> Self {
        Self {
            rel_type: RelationType::BelongsTo,
            from_tbl: parent.table_name().to_string(),
            to_tbl: related.table_name().to_string(),
            from_col: related.foreign_key(),
            to_col: related.primary_key().to_string(),
            related,
            conditions: Vec::new(),
        }
    }

    /// Override the foreign key column.
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        if self.rel_type.is_has_one_or_many() {
            self.to_col = column.into();
        } else {
            self.from_col = column.into();
        }
        self
    }

    /// Override the key the foreign key points at (parent key for has-one/has-many).
    pub fn local_key(mut self, column: impl Into<String>) -> Self {
        if self.rel_type.is_has_one_or_many() {
            self.from_col = column.into();
        } else {
            self.to_col = column.into();
        }
        self
    }

    /// Override the key the foreign key points at (related key for belongs-to).
    pub fn owner_key(self, column: impl Into<String>) -> Self {
        self.local_key(column)
    }

    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(column, BinOper::Equal, value)
    }

    pub fn where_op(
        mut self,
        column: impl Into<String>,
        operator: BinOper,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push(RelationWhere::Basic {
            column: column.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(RelationWhere::Null {
            column: column.into(),
        });
        self
    }

    pub fn where_not_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(RelationWhere::NotNull {
            column: column.into(),
        });
        self
    }

    pub fn where_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(RelationWhere::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Foreign key column name, wherever it lives.
    pub fn foreign_key_name(&self) -> &str {
        if self.rel_type.is_has_one_or_many() {
            &self.to_col
        } else {
            &self.from_col
        }
    }

    /// Qualified foreign key, `table.column`.
    pub fn qualified_foreign_key(&self) -> String {
        if self.rel_type.is_has_one_or_many() {
            format!("{}.{}", self.to_tbl, self.to_col)
        } else {
            format!("{}.{}", self.from_tbl, self.from_col)
        }
    }

    /// Parent column whose value the related rows are matched against.
    pub fn parent_key_name(&self) -> &str {
        &self.from_col
    }

    /// Predicates implied by the relation itself for a given parent key value.
    ///
    /// has-one/has-many: `related.fk = key` and `related.fk IS NOT NULL`.
    /// belongs-to: `related.owner_key = key`.
    pub fn key_constraints(&self, parent_key: Value) -> Vec<RelationWhere> {
        let qualified = format!("{}.{}", self.to_tbl, self.to_col);
        let mut constraints = vec![RelationWhere::Basic {
            column: qualified.clone(),
            operator: BinOper::Equal,
            value: parent_key,
        }];
        if self.rel_type.is_has_one_or_many() {
            constraints.push(RelationWhere::NotNull { column: qualified });
        }
        constraints
    }

    /// Number of leading entries of [`query_wheres`](Self::query_wheres) that are key constraints.
    pub fn leading_constraint_count(&self) -> usize {
        if self.rel_type.is_has_one_or_many() {
            2
        } else {
            1
        }
    }

    /// Full predicate list of the relation query: key constraints, then declared conditions.
    pub fn query_wheres(&self, parent_key: Value) -> Vec<RelationWhere> {
        let mut wheres = self.key_constraints(parent_key);
        wheres.extend(self.conditions.iter().cloned());
        wheres
    }

    /// Qualified `ON` operands with the related table replaced by `alias`.
    ///
    /// Operand order follows the relation kind: parent key first for
    /// has-one/has-many, related key first for belongs-to.
    pub fn join_operands(&self, alias: &str) -> (String, String) {
        let parent = format!("{}.{}", self.from_tbl, self.from_col);
        let related = format!("{alias}.{}", self.to_col);
        if self.rel_type.is_has_one_or_many() {
            (parent, related)
        } else {
            (related, parent)
        }
    }

    /// Declared conditions without a parent key, as they appear after the key constraints.
    pub fn migratable_wheres(&self) -> Vec<RelationWhere> {
        self.query_wheres(null())
            .into_iter()
            .skip(self.leading_constraint_count())
            .collect()
    }
}
