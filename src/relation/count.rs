//! Relation-count cache.
//!
//! `Record::relation_count*` run one grouped aggregate per cache index:
//!
//! ```sql
//! SELECT "user_id", COUNT("user_id") AS "count" FROM "comments"
//! WHERE "comments"."user_id" = $1 AND "comments"."user_id" IS NOT NULL [AND "column" = $2]
//! GROUP BY "user_id" LIMIT 1
//! ```
//!
//! The fetched row (or its absence) is stored on the record under the index and
//! reused by later calls with the same index. There is no invalidation; the cache
//! lives as long as the record.

use super::{column_expr, RelationDef, RelationError};
use crate::executor::LifeExecutor;
use crate::model::{LifeEntity, Record};
use crate::value::{self, as_i64, to_index_fragment};
use sea_query::{Alias, Expr, ExprTrait, Func, PostgresQueryBuilder, Query, SelectStatement, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Cached count rows by index. A stored `None` means "queried, no row".
#[derive(Debug, Clone, Default)]
pub struct RelationCountCache {
    entries: HashMap<String, Option<Record>>,
}

impl RelationCountCache {
    /// `None` when the index was never queried.
    pub fn get(&self, index: &str) -> Option<Option<&Record>> {
        self.entries.get(index).map(Option::as_ref)
    }

    pub fn contains(&self, index: &str) -> bool {
        self.entries.contains_key(index)
    }

    pub fn insert(&mut self, index: impl Into<String>, row: Option<Record>) {
        self.entries.insert(index.into(), row);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which related entity to count, and through which keys.
///
/// Keys default to has-one conventions: `{singular parent table}_id` on the
/// related table, matched against the parent's primary key.
#[derive(Clone)]
pub struct CountTarget {
    related: Arc<dyn LifeEntity>,
    foreign_key: Option<String>,
    local_key: Option<String>,
}

impl CountTarget {
    pub fn new(related: Arc<dyn LifeEntity>) -> Self {
        Self {
            related,
            foreign_key: None,
            local_key: None,
        }
    }

    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    pub fn local_key(mut self, column: impl Into<String>) -> Self {
        self.local_key = Some(column.into());
        self
    }

    fn relation(&self, parent: &dyn LifeEntity) -> RelationDef {
        let mut relation = RelationDef::has_one(parent, self.related.clone());
        if let Some(fk) = &self.foreign_key {
            relation = relation.foreign_key(fk.clone());
        }
        if let Some(key) = &self.local_key {
            relation = relation.local_key(key.clone());
        }
        relation
    }
}

/// Filter value for `relation_count_where`: a scalar, or a record whose key is used.
#[derive(Debug, Clone)]
pub enum CountFilter<'a> {
    Value(Value),
    Record(&'a Record),
}

impl CountFilter<'_> {
    pub fn resolve(&self) -> Value {
        match self {
            CountFilter::Value(value) => value.clone(),
            CountFilter::Record(record) => record.key(),
        }
    }
}

impl From<Value> for CountFilter<'_> {
    fn from(value: Value) -> Self {
        CountFilter::Value(value)
    }
}

impl<'a> From<&'a Record> for CountFilter<'a> {
    fn from(record: &'a Record) -> Self {
        CountFilter::Record(record)
    }
}

impl From<&str> for CountFilter<'_> {
    fn from(value: &str) -> Self {
        CountFilter::Value(Value::from(value))
    }
}

impl From<String> for CountFilter<'_> {
    fn from(value: String) -> Self {
        CountFilter::Value(Value::from(value))
    }
}

impl From<i32> for CountFilter<'_> {
    fn from(value: i32) -> Self {
        CountFilter::Value(Value::from(value))
    }
}

impl From<i64> for CountFilter<'_> {
    fn from(value: i64) -> Self {
        CountFilter::Value(Value::from(value))
    }
}

impl From<bool> for CountFilter<'_> {
    fn from(value: bool) -> Self {
        CountFilter::Value(Value::from(value))
    }
}

/// `count` column of a cached row, `0` when there is no row.
pub fn count_from_row(row: Option<&Record>) -> i64 {
    row.and_then(|r| r.get_attribute("count"))
        .map(as_i64)
        .unwrap_or(0)
}

impl Record {
    /// Aggregate query for a count target, optionally filtered by `column = value`.
    pub fn relation_count_query(
        &self,
        target: &CountTarget,
        filter: Option<(&str, &Value)>,
    ) -> SelectStatement {
        let relation = target.relation(self.entity().as_ref());
        let fk = relation.foreign_key_name().to_string();
        let parent_key = self
            .get_attribute(relation.parent_key_name())
            .cloned()
            .unwrap_or_else(value::null);

        let mut query = Query::select();
        query
            .column(Alias::new(&fk))
            .expr_as(Func::count(Expr::col(Alias::new(&fk))), Alias::new("count"))
            .from(Alias::new(&relation.to_tbl));
        for predicate in relation.query_wheres(parent_key) {
            query.and_where(predicate.to_expr());
        }
        if let Some((column, value)) = filter {
            query.and_where(column_expr(column).eq(value.clone()));
        }
        query.group_by_col(Alias::new(&fk)).limit(1);
        query
    }

    /// Cached count row for `index`, running the query on first use.
    ///
    /// # Errors
    ///
    /// Returns `RelationError::Executor` if the query fails. Nothing is cached then.
    pub fn relation_count_object<E>(
        &mut self,
        executor: &E,
        index: &str,
        target: &CountTarget,
    ) -> Result<Option<&Record>, RelationError>
    where
        E: LifeExecutor + ?Sized,
    {
        self.cached_count_row(executor, index, target, None)
    }

    /// Number of related rows, cached under `index`.
    ///
    /// # Errors
    ///
    /// Returns `RelationError::Executor` if the query fails.
    pub fn relation_count<E>(
        &mut self,
        executor: &E,
        index: &str,
        target: &CountTarget,
    ) -> Result<i64, RelationError>
    where
        E: LifeExecutor + ?Sized,
    {
        let row = self.relation_count_object(executor, index, target)?;
        Ok(count_from_row(row))
    }

    /// Filtered count row. `index` is extended with `{column}_{value}` before the
    /// cache lookup, so each filter value gets its own slot. A record filter is
    /// replaced by its key.
    ///
    /// # Errors
    ///
    /// Returns `RelationError::Executor` if the query fails.
    pub fn relation_count_object_where<'f, E>(
        &mut self,
        executor: &E,
        index: &mut String,
        column: &str,
        value: impl Into<CountFilter<'f>>,
        target: &CountTarget,
    ) -> Result<Option<&Record>, RelationError>
    where
        E: LifeExecutor + ?Sized,
    {
        let value = value.into().resolve();
        index.push_str(&format!("{column}_{}", to_index_fragment(&value)));
        self.cached_count_row(executor, index, target, Some((column, &value)))
    }

    /// Filtered count, see [`relation_count_object_where`](Self::relation_count_object_where).
    ///
    /// # Errors
    ///
    /// Returns `RelationError::Executor` if the query fails.
    pub fn relation_count_where<'f, E>(
        &mut self,
        executor: &E,
        index: &mut String,
        column: &str,
        value: impl Into<CountFilter<'f>>,
        target: &CountTarget,
    ) -> Result<i64, RelationError>
    where
        E: LifeExecutor + ?Sized,
    {
        let row = self.relation_count_object_where(executor, index, column, value, target)?;
        Ok(count_from_row(row))
    }

    pub fn count_cache(&self) -> &RelationCountCache {
        &self.count_cache
    }

    fn cached_count_row<E>(
        &mut self,
        executor: &E,
        index: &str,
        target: &CountTarget,
        filter: Option<(&str, &Value)>,
    ) -> Result<Option<&Record>, RelationError>
    where
        E: LifeExecutor + ?Sized,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::relation_count_span(index).entered();

        let hit = self.count_cache.contains(index);
        #[cfg(feature = "metrics")]
        METRICS.record_count_cache(hit);

        if hit {
            log::debug!("{}: relation count cache hit for '{index}'", self.table_name());
        } else {
            log::debug!("{}: relation count cache miss for '{index}'", self.table_name());
            let (sql, values) = self
                .relation_count_query(target, filter)
                .build(PostgresQueryBuilder);
            let row = executor
                .query_optional(&sql, &values)?
                .map(|attributes| Record::from_row(target.related.clone(), attributes));
            self.count_cache.insert(index, row);
        }

        Ok(self.count_cache.get(index).flatten())
    }
}
