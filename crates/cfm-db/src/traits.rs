//! Store capability trait

use crate::error::DbResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A row keyed by column name. Values travel as text.
pub type Row = BTreeMap<String, String>;

/// Conjunction of `column = value` predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    predicates: Vec<(String, String)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `column = value` predicate.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push((column.into(), value.into()));
        self
    }

    pub fn predicates(&self) -> &[(String, String)] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Generic store capability used by the ledger and by migration scripts.
///
/// Implementations must be Send + Sync for async operation. Every call is
/// awaited to completion before the caller proceeds.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read rows of `table` matching `criteria`, keeping only `projection`
    /// columns (all columns when empty).
    ///
    /// Fails with [`DbError::TableNotFound`](crate::DbError::TableNotFound)
    /// when the table does not exist.
    async fn select(
        &self,
        table: &str,
        criteria: &Criteria,
        projection: &[&str],
    ) -> DbResult<Vec<Row>>;

    /// Insert `row` into `table`. A row with the same primary key that is
    /// already present is left untouched, so every table written through
    /// this call must declare a primary key.
    async fn write(&self, table: &str, row: &Row) -> DbResult<()>;

    /// Delete rows of `table` matching `criteria`. Deleting nothing is not
    /// an error; empty criteria are refused.
    async fn delete(&self, table: &str, criteria: &Criteria) -> DbResult<()>;

    /// Execute DDL (one or more statements).
    async fn execute(&self, ddl: &str) -> DbResult<()>;

    /// Store type identifier for logging
    fn db_type(&self) -> &'static str;
}
