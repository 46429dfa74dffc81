//! Relation joins with aliasing.
//!
//! [`SelectQuery::model_join`] joins a named relation of the query's entity under
//! an alias equal to the relation name, projects the joined columns as
//! `"alias"."column" AS "alias.column"` and moves the relation's declared
//! conditions into the `ON` clause. Loading the rows through
//! [`Record::from_row`](crate::model::Record::from_row) turns those prefixed columns
//! back into related records.

use super::{alias_column, column_expr, RelationError, RelationWhere};
use crate::query::{SchemaIntrospector, SelectQuery};
use sea_query::{Alias, BinOper, Condition, Expr, ExprTrait, JoinType, Value};
use std::fmt;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Joined columns to add to the projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum JoinColumns {
    /// Every column of the joined table, from schema introspection
    #[default]
    All,
    /// Exactly these columns; an empty list selects every column like `All`
    Only(Vec<String>),
    /// No extra columns
    Skip,
}

/// `ON` clause under construction, handed to the join extension callback.
///
/// Column arguments may name the joined table, the alias, or be bare; the first
/// two resolve to the alias and bare columns are qualified with it.
pub struct JoinClause {
    table: String,
    alias: String,
    condition: Condition,
}

impl JoinClause {
    fn new(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: alias.to_string(),
            condition: Condition::all(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    fn push(&mut self, expr: Expr) {
        let condition = std::mem::replace(&mut self.condition, Condition::all());
        self.condition = condition.add(expr);
    }

    /// Column to column comparison. Both sides must be qualified.
    pub fn on(&mut self, first: &str, operator: BinOper, second: &str) -> &mut Self {
        self.push(column_expr(first).binary(operator, column_expr(second)));
        self
    }

    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_op(column, BinOper::Equal, value)
    }

    pub fn where_op(&mut self, column: &str, operator: BinOper, value: impl Into<Value>) -> &mut Self {
        self.add_where(RelationWhere::Basic {
            column: column.to_string(),
            operator,
            value: value.into(),
        })
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.add_where(RelationWhere::Null {
            column: column.to_string(),
        })
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.add_where(RelationWhere::NotNull {
            column: column.to_string(),
        })
    }

    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_where(RelationWhere::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Add a predicate, rewritten to the alias.
    pub fn add_where(&mut self, predicate: RelationWhere) -> &mut Self {
        let predicate = predicate.aliased(&self.table, &self.alias);
        self.push(predicate.to_expr());
        self
    }
}

/// Options for [`SelectQuery::model_join`] and [`SelectQuery::join_with_select`].
///
/// Defaults: `=`, `LEFT JOIN`, every column of the joined table, no extension.
pub struct JoinOptions<'a> {
    pub operator: BinOper,
    pub join_type: JoinType,
    pub columns: JoinColumns,
    extend: Option<Box<dyn FnOnce(&mut JoinClause) + 'a>>,
}

impl Default for JoinOptions<'_> {
    fn default() -> Self {
        Self {
            operator: BinOper::Equal,
            join_type: JoinType::LeftJoin,
            columns: JoinColumns::All,
            extend: None,
        }
    }
}

impl fmt::Debug for JoinOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinOptions")
            .field("operator", &self.operator)
            .field("join_type", &self.join_type)
            .field("columns", &self.columns)
            .field("extend", &self.extend.is_some())
            .finish()
    }
}

impl<'a> JoinOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operator(mut self, operator: BinOper) -> Self {
        self.operator = operator;
        self
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    pub fn columns(mut self, columns: JoinColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn only<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns(JoinColumns::Only(columns.into_iter().map(Into::into).collect()))
    }

    pub fn without_columns(self) -> Self {
        self.columns(JoinColumns::Skip)
    }

    /// Callback adding conditions to the `ON` clause after the key comparison.
    pub fn extend<F>(mut self, extend: F) -> Self
    where
        F: FnOnce(&mut JoinClause) + 'a,
    {
        self.extend = Some(Box::new(extend));
        self
    }
}

impl SelectQuery {
    /// Join the relation `relation_name` of this query's entity.
    ///
    /// The joined table is aliased as the relation name. The `ON` clause is the
    /// key comparison, then the conditions from `options`' extension, then the
    /// conditions declared on the relation (rewritten to the alias, bind order
    /// kept). `schema` is only consulted for [`JoinColumns::All`] or an empty
    /// [`JoinColumns::Only`] list.
    ///
    /// # Example
    ///
    /// ```
    /// use lifeguard_support::model::LifeEntity;
    /// use lifeguard_support::query::{SelectQuery, StaticSchema};
    /// use lifeguard_support::relation::{JoinOptions, RelationDef};
    /// use std::sync::Arc;
    ///
    /// struct User;
    /// impl LifeEntity for User {
    ///     fn table_name(&self) -> &str { "users" }
    /// }
    ///
    /// struct Post;
    /// impl LifeEntity for Post {
    ///     fn table_name(&self) -> &str { "posts" }
    ///     fn relation(&self, name: &str) -> Option<RelationDef> {
    ///         match name {
    ///             "author" => Some(RelationDef::belongs_to(self, Arc::new(User)).foreign_key("author_id")),
    ///             _ => None,
    ///         }
    ///     }
    /// }
    ///
    /// let schema = StaticSchema::new().with_table("users", ["id", "name"]);
    /// let (sql, _) = SelectQuery::new(Arc::new(Post))
    ///     .model_join("author", JoinOptions::new(), &schema)?
    ///     .build();
    /// assert!(sql.contains(r#"LEFT JOIN "users" AS "author" ON "author"."id" = "posts"."author_id""#));
    /// assert!(sql.contains(r#""author"."name" AS "author.name""#));
    /// # Ok::<(), lifeguard_support::relation::RelationError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `RelationError::UnknownRelation` when the entity has no such
    /// relation, and `RelationError::Executor` when column introspection fails.
    pub fn model_join(
        self,
        relation_name: &str,
        mut options: JoinOptions<'_>,
        schema: &dyn SchemaIntrospector,
    ) -> Result<Self, RelationError> {
        let relation = self.entity().relation(relation_name).ok_or_else(|| {
            RelationError::UnknownRelation {
                entity: self.entity().table_name().to_string(),
                relation: relation_name.to_string(),
            }
        })?;

        let (first, second) = relation.join_operands(relation_name);
        let migrated = relation.migratable_wheres();
        let user_extend = options.extend.take();
        let options = JoinOptions {
            extend: Some(Box::new(move |join: &mut JoinClause| {
                if let Some(extend) = user_extend {
                    extend(join);
                }
                for predicate in migrated {
                    join.add_where(predicate);
                }
            })),
            ..options
        };

        self.join_aliased(&relation.to_tbl, relation_name, &first, &second, options, schema)
    }

    /// Join `table` (optionally under `alias`) on `first <op> second`.
    ///
    /// `first` and `second` are qualified columns; references to `table` in them
    /// are rewritten to the alias.
    ///
    /// # Errors
    ///
    /// Returns `RelationError::Executor` when column introspection fails.
    pub fn join_with_select(
        self,
        table: &str,
        alias: Option<&str>,
        first: &str,
        second: &str,
        options: JoinOptions<'_>,
        schema: &dyn SchemaIntrospector,
    ) -> Result<Self, RelationError> {
        let alias = alias.unwrap_or(table);
        let first = alias_column(first, table, alias);
        let second = alias_column(second, table, alias);
        self.join_aliased(table, alias, &first, &second, options, schema)
    }

    fn join_aliased(
        mut self,
        table: &str,
        alias: &str,
        first: &str,
        second: &str,
        options: JoinOptions<'_>,
        schema: &dyn SchemaIntrospector,
    ) -> Result<Self, RelationError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::relation_join_span(table, alias).entered();

        let columns = match options.columns {
            JoinColumns::All => schema.column_listing(table)?,
            JoinColumns::Only(columns) if columns.is_empty() => schema.column_listing(table)?,
            JoinColumns::Only(columns) => columns,
            JoinColumns::Skip => Vec::new(),
        };
        for column in &columns {
            self.query.expr_as(
                Expr::col((Alias::new(alias), Alias::new(column))),
                Alias::new(format!("{alias}.{column}")),
            );
        }

        let mut clause = JoinClause::new(table, alias);
        clause.on(first, options.operator, second);
        if let Some(extend) = options.extend {
            extend(&mut clause);
        }

        if alias == table {
            self.query
                .join(options.join_type, Alias::new(table), clause.condition);
        } else {
            self.query.join_as(
                options.join_type,
                Alias::new(table),
                Alias::new(alias),
                clause.condition,
            );
        }

        log::debug!(
            "{}: joined {table} as {alias} with {} column(s)",
            self.entity().table_name(),
            columns.len()
        );
        #[cfg(feature = "metrics")]
        METRICS.record_join(alias);

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LifeEntity;
    use crate::query::StaticSchema;
    use crate::relation::RelationDef;
    use std::sync::Arc;

    struct User;
    impl LifeEntity for User {
        fn table_name(&self) -> &str {
            "users"
        }

        fn relation(&self, name: &str) -> Option<RelationDef> {
            match name {
                "manager" => Some(
                    RelationDef::belongs_to(self, Arc::new(User)).foreign_key("manager_id"),
                ),
                "posts" => Some(RelationDef::has_many(self, Arc::new(Post))),
                "published" => Some(
                    RelationDef::has_many(self, Arc::new(Post))
                        .where_eq("posts.state", "published")
                        .where_null("deleted_at"),
                ),
                _ => None,
            }
        }
    }

    struct Post;
    impl LifeEntity for Post {
        fn table_name(&self) -> &str {
            "posts"
        }
    }

    fn schema() -> StaticSchema {
        StaticSchema::new()
            .with_table("users", ["id", "name", "manager_id"])
            .with_table("posts", ["id", "user_id", "state"])
    }

    fn users() -> SelectQuery {
        SelectQuery::new(Arc::new(User))
    }

    #[test]
    fn test_has_many_join_with_all_columns() {
        let (sql, _) = users()
            .model_join("posts", JoinOptions::new(), &schema())
            .unwrap()
            .build();
        assert!(sql.contains(r#""posts"."id" AS "posts.id""#), "{sql}");
        assert!(sql.contains(r#""posts"."user_id" AS "posts.user_id""#), "{sql}");
        assert!(sql.contains(r#""posts"."state" AS "posts.state""#), "{sql}");
        assert!(sql.contains(r#"ON "users"."id" = "posts"."user_id""#), "{sql}");
        assert!(sql.contains("LEFT JOIN"), "{sql}");
    }

    #[test]
    fn test_explicit_column_list() {
        let (sql, _) = users()
            .model_join("posts", JoinOptions::new().only(["state"]), &schema())
            .unwrap()
            .build();
        assert!(sql.contains(r#""posts"."state" AS "posts.state""#), "{sql}");
        assert!(!sql.contains(r#"AS "posts.id""#), "{sql}");
    }

    #[test]
    fn test_empty_column_list_selects_every_column() {
        let (sql, _) = users()
            .model_join("posts", JoinOptions::new().only(Vec::<String>::new()), &schema())
            .unwrap()
            .build();
        assert!(sql.contains(r#""posts"."id" AS "posts.id""#), "{sql}");
        assert!(sql.contains(r#""posts"."user_id" AS "posts.user_id""#), "{sql}");
        assert!(sql.contains(r#""posts"."state" AS "posts.state""#), "{sql}");
    }

    #[test]
    fn test_skip_columns_adds_no_projection() {
        let (sql, _) = users()
            .model_join("posts", JoinOptions::new().without_columns(), &StaticSchema::new())
            .unwrap()
            .build();
        assert!(sql.starts_with(r#"SELECT "users".* FROM"#), "{sql}");
        assert!(!sql.contains(" AS \"posts."), "{sql}");
    }

    #[test]
    fn test_self_join_aliases_only_related_side() {
        let (sql, _) = users()
            .model_join("manager", JoinOptions::new().only(["name"]), &schema())
            .unwrap()
            .build();
        assert!(
            sql.contains(r#"LEFT JOIN "users" AS "manager" ON "manager"."id" = "users"."manager_id""#),
            "{sql}"
        );
    }

    #[test]
    fn test_relation_conditions_move_into_on_clause() {
        let (sql, values) = users()
            .model_join(
                "published",
                JoinOptions::new()
                    .without_columns()
                    .extend(|join| {
                        join.where_op("posts.id", BinOper::GreaterThan, 10);
                    }),
                &schema(),
            )
            .unwrap()
            .build();
        assert!(sql.contains(r#""published"."id" > $1"#), "{sql}");
        assert!(sql.contains(r#""published"."state" = $2"#), "{sql}");
        assert!(sql.contains(r#""published"."deleted_at" IS NULL"#), "{sql}");
        assert!(!sql.contains("WHERE"), "{sql}");
        assert_eq!(values.0, vec![Value::Int(Some(10)), Value::from("published")]);
    }

    #[test]
    fn test_inner_join_and_operator() {
        let (sql, _) = users()
            .model_join(
                "posts",
                JoinOptions::new()
                    .join_type(JoinType::InnerJoin)
                    .operator(BinOper::NotEqual)
                    .without_columns(),
                &schema(),
            )
            .unwrap()
            .build();
        assert!(sql.contains(r#"INNER JOIN "posts" ON "users"."id" <> "posts"."user_id""#), "{sql}");
    }

    #[test]
    fn test_unknown_relation() {
        let err = users()
            .model_join("nope", JoinOptions::new(), &schema())
            .unwrap_err();
        assert!(matches!(err, RelationError::UnknownRelation { .. }));
    }

    #[test]
    fn test_join_with_select_rewrites_table_to_alias() {
        let (sql, _) = users()
            .join_with_select(
                "posts",
                Some("latest"),
                "users.id",
                "posts.user_id",
                JoinOptions::new().only(["id"]),
                &schema(),
            )
            .unwrap()
            .build();
        assert!(sql.contains(r#""latest"."id" AS "latest.id""#), "{sql}");
        assert!(sql.contains(r#"ON "users"."id" = "latest"."user_id""#), "{sql}");
    }

    #[test]
    fn test_missing_schema_table_is_error() {
        let result = users().model_join("posts", JoinOptions::new(), &StaticSchema::new());
        assert!(matches!(result, Err(RelationError::Executor(_))));
    }
}
