//! Column listing for joined tables.

use crate::executor::{LifeError, LifeExecutor};
use crate::value::as_str;
use sea_query::{Alias, Expr, ExprTrait, Order, PostgresQueryBuilder, Query};
use std::collections::HashMap;

/// Lists the columns of a table, in table order.
pub trait SchemaIntrospector {
    /// # Errors
    ///
    /// Returns `LifeError` if the listing cannot be produced.
    fn column_listing(&self, table: &str) -> Result<Vec<String>, LifeError>;
}

/// Fixed column lists, for tests and for callers that already know their schema.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    tables: HashMap<String, Vec<String>>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table<I, S>(mut self, table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.insert(
            table.to_string(),
            columns.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl SchemaIntrospector for StaticSchema {
    fn column_listing(&self, table: &str) -> Result<Vec<String>, LifeError> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| LifeError::Other(format!("No columns known for table '{table}'")))
    }
}

/// Reads `information_schema.columns` through an executor.
pub struct InformationSchema<'a, E: LifeExecutor + ?Sized> {
    executor: &'a E,
    schema: Option<String>,
}

impl<'a, E: LifeExecutor + ?Sized> InformationSchema<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self {
            executor,
            schema: None,
        }
    }

    /// Restrict the lookup to one schema (`public` and friends).
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

impl<E: LifeExecutor + ?Sized> SchemaIntrospector for InformationSchema<'_, E> {
    fn column_listing(&self, table: &str) -> Result<Vec<String>, LifeError> {
        let mut query = Query::select();
        query
            .expr_as(Expr::cust("column_name::text"), Alias::new("column_name"))
            .from((Alias::new("information_schema"), Alias::new("columns")))
            .and_where(Expr::col(Alias::new("table_name")).eq(table));
        if let Some(schema) = &self.schema {
            query.and_where(Expr::col(Alias::new("table_schema")).eq(schema.as_str()));
        }
        query.order_by(Alias::new("ordinal_position"), Order::Asc);

        let (sql, values) = query.build(PostgresQueryBuilder);
        let rows = self.executor.query_all(&sql, &values)?;
        let columns = rows
            .iter()
            .map(|row| {
                row.get("column_name")
                    .and_then(as_str)
                    .map(str::to_string)
                    .ok_or_else(|| LifeError::ParseError("column_name is not text".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("{table}: {} column(s) from information_schema", columns.len());
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockExecutor;
    use crate::value::Attributes;
    use sea_query::Value;

    fn column(name: &str) -> Attributes {
        let mut row = Attributes::new();
        row.insert("column_name".to_string(), Value::from(name));
        row
    }

    #[test]
    fn test_static_schema() {
        let schema = StaticSchema::new().with_table("users", ["id", "name"]);
        assert_eq!(schema.column_listing("users").unwrap(), vec!["id", "name"]);
        assert!(schema.column_listing("posts").is_err());
    }

    #[test]
    fn test_information_schema_query() {
        let executor = MockExecutor::new().with_rows(vec![column("id"), column("email")]);
        let columns = InformationSchema::new(&executor)
            .in_schema("public")
            .column_listing("users")
            .unwrap();

        assert_eq!(columns, vec!["id", "email"]);
        let statement = &executor.statements()[0];
        assert!(statement.sql.contains(r#"FROM "information_schema"."columns""#));
        assert!(statement.sql.contains(r#"ORDER BY "ordinal_position" ASC"#));
        assert_eq!(
            statement.values.0,
            vec![Value::from("users"), Value::from("public")]
        );
    }

    #[test]
    fn test_information_schema_rejects_non_text() {
        let mut row = Attributes::new();
        row.insert("column_name".to_string(), Value::Int(Some(1)));
        let executor = MockExecutor::new().with_rows(vec![row]);
        let result = InformationSchema::new(&executor).column_listing("users");
        assert!(matches!(result, Err(LifeError::ParseError(_))));
    }
}
