//! In-memory executor for tests.
//!
//! [`MockExecutor`] records every statement it receives and answers queries from a
//! queue of prepared results, so count-cache and join behavior can be checked
//! without a database.

use crate::executor::{LifeError, LifeExecutor};
use crate::value::Attributes;
use sea_query::Values;
use std::cell::RefCell;
use std::collections::VecDeque;

/// A statement received by [`MockExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub values: Values,
}

/// Executor answering from queued results.
///
/// Each query pops the next queued result; once the queue is empty queries return
/// no rows.
#[derive(Debug, Default)]
pub struct MockExecutor {
    results: RefCell<VecDeque<Result<Vec<Attributes>, String>>>,
    statements: RefCell<Vec<RecordedStatement>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next query.
    pub fn with_rows(self, rows: Vec<Attributes>) -> Self {
        self.results.borrow_mut().push_back(Ok(rows));
        self
    }

    /// Queue a failure (`LifeError::QueryError`) for the next query.
    pub fn with_error(self, message: &str) -> Self {
        self.results
            .borrow_mut()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.statements.borrow().clone()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.borrow().len()
    }

    fn next_result(&self, query: &str, values: &Values) -> Result<Vec<Attributes>, LifeError> {
        self.statements.borrow_mut().push(RecordedStatement {
            sql: query.to_string(),
            values: values.clone(),
        });
        match self.results.borrow_mut().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(LifeError::QueryError(message)),
            None => Ok(Vec::new()),
        }
    }
}

impl LifeExecutor for MockExecutor {
    fn execute(&self, query: &str, values: &Values) -> Result<u64, LifeError> {
        let rows = self.next_result(query, values)?;
        Ok(rows.len() as u64)
    }

    fn query_all(&self, query: &str, values: &Values) -> Result<Vec<Attributes>, LifeError> {
        self.next_result(query, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_are_consumed_in_order() {
        let executor = MockExecutor::new()
            .with_error("down")
            .with_rows(vec![Attributes::new()]);
        let empty = Values(Vec::new());

        assert!(executor.query_all("SELECT 1", &empty).is_err());
        assert_eq!(executor.query_all("SELECT 2", &empty).unwrap().len(), 1);
        assert!(executor.query_all("SELECT 3", &empty).unwrap().is_empty());
        assert_eq!(executor.statement_count(), 3);
        assert_eq!(executor.statements()[1].sql, "SELECT 2");
    }
}
