//! Select query builder bound to an entity.
//!
//! `SelectQuery` wraps a `sea_query::SelectStatement` that starts as
//! `SELECT "table".* FROM "table"`. Joins from [`crate::relation::join`] add
//! aliased columns to it, and [`all`](SelectQuery::all) loads the rows as
//! [`Record`]s, hydrating those columns into related records.

use crate::executor::{LifeError, LifeExecutor};
use crate::model::{LifeEntity, Record};
use crate::relation::column_expr;
use sea_query::{Alias, Asterisk, IntoCondition, Order, PostgresQueryBuilder, Query, SelectStatement, Values};
use std::fmt;
use std::sync::Arc;

/// Query builder for selecting records of one entity
///
/// # Example
///
/// ```
/// use lifeguard_support::model::LifeEntity;
/// use lifeguard_support::query::SelectQuery;
/// use sea_query::{Alias, Expr, ExprTrait, Order};
/// use std::sync::Arc;
///
/// struct User;
/// impl LifeEntity for User {
///     fn table_name(&self) -> &str { "users" }
/// }
///
/// let (sql, values) = SelectQuery::new(Arc::new(User))
///     .filter(Expr::col(Alias::new("active")).eq(true))
///     .order_by("users.id", Order::Desc)
///     .build();
/// assert_eq!(
///     sql,
///     r#"SELECT "users".* FROM "users" WHERE "active" = $1 ORDER BY "users"."id" DESC"#
/// );
/// assert_eq!(values.0.len(), 1);
/// ```
#[derive(Clone)]
pub struct SelectQuery {
    entity: Arc<dyn LifeEntity>,
    pub(crate) query: SelectStatement,
}

impl fmt::Debug for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQuery")
            .field("table", &self.entity.table_name())
            .field("sql", &self.build().0)
            .finish()
    }
}

impl SelectQuery {
    pub fn new(entity: Arc<dyn LifeEntity>) -> Self {
        let table = entity.table_name().to_string();
        let query = Query::select()
            .column((Alias::new(&table), Asterisk))
            .from(Alias::new(&table))
            .to_owned();
        Self { entity, query }
    }

    pub fn entity(&self) -> &Arc<dyn LifeEntity> {
        &self.entity
    }

    /// Add a filter condition
    ///
    /// Accepts anything implementing `IntoCondition`: an `Expr` from
    /// `Expr::col(..).eq(..)`, or a `Condition` from `Condition::all()`/`any()`.
    pub fn filter<F>(mut self, condition: F) -> Self
    where
        F: IntoCondition,
    {
        self.query.cond_where(condition.into_condition());
        self
    }

    /// Add an ORDER BY clause
    ///
    /// `column` is either bare or qualified (`"table.column"`).
    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.query.order_by_expr(column_expr(column), order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset(offset);
        self
    }

    /// Render SQL with Postgres placeholders and the bound values.
    pub fn build(&self) -> (String, Values) {
        self.query.build(PostgresQueryBuilder)
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.query
    }

    /// Execute the query and return all records
    ///
    /// # Errors
    ///
    /// Returns `LifeError` if the query execution or row decoding fails.
    pub fn all<E: LifeExecutor + ?Sized>(&self, executor: &E) -> Result<Vec<Record>, LifeError> {
        let (sql, values) = self.build();
        let rows = executor.query_all(&sql, &values)?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(self.entity.clone(), row))
            .collect())
    }

    /// Execute the query with `LIMIT 1` and return the first record, if any
    ///
    /// # Errors
    ///
    /// Returns `LifeError` if the query execution or row decoding fails.
    pub fn one<E: LifeExecutor + ?Sized>(&self, executor: &E) -> Result<Option<Record>, LifeError> {
        Ok(self.clone().limit(1).all(executor)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockExecutor;
    use crate::value::Attributes;
    use sea_query::{Expr, ExprTrait, Value};

    struct User;
    impl LifeEntity for User {
        fn table_name(&self) -> &str {
            "users"
        }
    }

    fn row(id: i32) -> Attributes {
        let mut row = Attributes::new();
        row.insert("id".to_string(), Value::Int(Some(id)));
        row
    }

    #[test]
    fn test_new_selects_table_columns() {
        let (sql, values) = SelectQuery::new(Arc::new(User)).build();
        assert_eq!(sql, r#"SELECT "users".* FROM "users""#);
        assert!(values.0.is_empty());
    }

    #[test]
    fn test_limit_offset() {
        let (sql, values) = SelectQuery::new(Arc::new(User))
            .filter(Expr::col(Alias::new("id")).gt(5))
            .limit(10)
            .offset(20)
            .build();
        assert_eq!(
            sql,
            r#"SELECT "users".* FROM "users" WHERE "id" > $1 LIMIT $2 OFFSET $3"#
        );
        assert_eq!(values.0.len(), 3);
    }

    #[test]
    fn test_all_builds_records() {
        let executor = MockExecutor::new().with_rows(vec![row(1), row(2)]);
        let records = SelectQuery::new(Arc::new(User)).all(&executor).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].key(), Value::Int(Some(2)));
        assert_eq!(executor.statements()[0].sql, r#"SELECT "users".* FROM "users""#);
    }

    #[test]
    fn test_one_adds_limit() {
        let executor = MockExecutor::new().with_rows(vec![row(7)]);
        let record = SelectQuery::new(Arc::new(User)).one(&executor).unwrap();

        assert_eq!(record.map(|r| r.key()), Some(Value::Int(Some(7))));
        assert!(executor.statements()[0].sql.ends_with("LIMIT $1"));
    }

    #[test]
    fn test_one_without_rows() {
        let executor = MockExecutor::new();
        let record = SelectQuery::new(Arc::new(User)).one(&executor).unwrap();
        assert!(record.is_none());
    }
}
