//! Error types for cfm-db

use thiserror::Error;

/// Store operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] {operation} on '{target}' failed: {message}")]
    ExecutionError {
        operation: &'static str,
        target: String,
        message: String,
    },

    /// Table not found (D003)
    #[error("[D003] Table not found: {0}")]
    TableNotFound(String),

    /// Request the store refuses to run (D004)
    #[error("[D004] Invalid store request: {0}")]
    InvalidRequest(String),

    /// Mutex poisoned (D005)
    #[error("[D005] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Classify a DuckDB error raised by `operation` against `table`.
    ///
    /// duckdb::Error does not expose structured variants, so the message is
    /// inspected. Patterns are kept narrow so that column or type errors are
    /// not mistaken for a missing table.
    pub(crate) fn from_duckdb(err: duckdb::Error, operation: &'static str, table: &str) -> Self {
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(table.to_string())
        } else {
            DbError::ExecutionError {
                operation,
                target: table.to_string(),
                message: msg,
            }
        }
    }

    pub fn is_table_not_found(&self) -> bool {
        matches!(self, DbError::TableNotFound(_))
    }
}
