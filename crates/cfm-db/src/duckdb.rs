//! DuckDB store implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Criteria, Row, Store};
use async_trait::async_trait;
use cfm_core::config::is_plain_identifier;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB-backed store
pub struct DuckDbStore {
    conn: Mutex<Connection>,
}

impl DuckDbStore {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        log::debug!("Opening in-memory DuckDB database");
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        log::debug!("Opening DuckDB database at {}", path.display());
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn select_sync(
        &self,
        table: &str,
        criteria: &Criteria,
        projection: &[&str],
    ) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        let table_sql = quote_ident(table)?;

        let columns: Vec<String> = if projection.is_empty() {
            table_columns(&conn, table)?
        } else {
            projection.iter().map(|c| c.to_string()).collect()
        };
        let column_sql = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<DbResult<Vec<_>>>()?
            .join(", ");
        let (where_sql, params) = where_clause(criteria)?;

        let sql = format!("SELECT {column_sql} FROM {table_sql}{where_sql}");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DbError::from_duckdb(e, "select", table))?;

        let rows = stmt
            .query_map(duckdb::params_from_iter(params), |row| {
                let mut out = Row::new();
                for (idx, column) in columns.iter().enumerate() {
                    if let Some(value) = get_column_as_string(row, idx) {
                        out.insert(column.clone(), value);
                    }
                }
                Ok(out)
            })
            .map_err(|e| DbError::from_duckdb(e, "select", table))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::from_duckdb(e, "select", table))?;
        Ok(rows)
    }

    fn write_sync(&self, table: &str, row: &Row) -> DbResult<()> {
        if row.is_empty() {
            return Err(DbError::InvalidRequest(format!(
                "write to '{table}' has no columns"
            )));
        }
        let table_sql = quote_ident(table)?;
        let column_sql = row
            .keys()
            .map(|c| quote_ident(c))
            .collect::<DbResult<Vec<_>>>()?
            .join(", ");
        let placeholders = vec!["?"; row.len()].join(", ");
        let sql = format!("INSERT OR IGNORE INTO {table_sql} ({column_sql}) VALUES ({placeholders})");

        let conn = self.lock()?;
        let inserted = conn
            .execute(&sql, duckdb::params_from_iter(row.values()))
            .map_err(|e| DbError::from_duckdb(e, "write", table))?;
        if inserted == 0 {
            log::debug!("Row already present in {table}, left unchanged");
        }
        Ok(())
    }

    fn delete_sync(&self, table: &str, criteria: &Criteria) -> DbResult<()> {
        if criteria.is_empty() {
            return Err(DbError::InvalidRequest(format!(
                "delete from '{table}' without criteria"
            )));
        }
        let table_sql = quote_ident(table)?;
        let (where_sql, params) = where_clause(criteria)?;
        let sql = format!("DELETE FROM {table_sql}{where_sql}");

        let conn = self.lock()?;
        let deleted = conn
            .execute(&sql, duckdb::params_from_iter(params))
            .map_err(|e| DbError::from_duckdb(e, "delete", table))?;
        log::debug!("Deleted {deleted} row(s) from {table}");
        Ok(())
    }

    fn execute_sync(&self, ddl: &str) -> DbResult<()> {
        log::debug!("Executing: {}", summarize(ddl));
        let conn = self.lock()?;
        conn.execute_batch(ddl).map_err(|e| DbError::ExecutionError {
            operation: "execute",
            target: summarize(ddl),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Store for DuckDbStore {
    async fn select(
        &self,
        table: &str,
        criteria: &Criteria,
        projection: &[&str],
    ) -> DbResult<Vec<Row>> {
        self.select_sync(table, criteria, projection)
    }

    async fn write(&self, table: &str, row: &Row) -> DbResult<()> {
        self.write_sync(table, row)
    }

    async fn delete(&self, table: &str, criteria: &Criteria) -> DbResult<()> {
        self.delete_sync(table, criteria)
    }

    async fn execute(&self, ddl: &str) -> DbResult<()> {
        self.execute_sync(ddl)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Double-quote a plain identifier, refusing anything else.
fn quote_ident(name: &str) -> DbResult<String> {
    if !is_plain_identifier(name) {
        return Err(DbError::InvalidRequest(format!(
            "'{name}' is not a plain identifier"
        )));
    }
    Ok(format!("\"{name}\""))
}

/// Build ` WHERE a = ? AND b = ?` plus its bound values.
fn where_clause(criteria: &Criteria) -> DbResult<(String, Vec<&str>)> {
    if criteria.is_empty() {
        return Ok((String::new(), Vec::new()));
    }
    let mut terms = Vec::with_capacity(criteria.predicates().len());
    let mut params = Vec::with_capacity(criteria.predicates().len());
    for (column, value) in criteria.predicates() {
        terms.push(format!("{} = ?", quote_ident(column)?));
        params.push(value.as_str());
    }
    Ok((format!(" WHERE {}", terms.join(" AND ")), params))
}

/// Column names of `table` in declaration order.
fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE lower(table_name) = lower(?) ORDER BY ordinal_position",
        )
        .map_err(|e| DbError::from_duckdb(e, "select", table))?;
    let columns = stmt
        .query_map(duckdb::params![table], |row| row.get::<_, String>(0))
        .map_err(|e| DbError::from_duckdb(e, "select", table))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::from_duckdb(e, "select", table))?;
    if columns.is_empty() {
        return Err(DbError::TableNotFound(table.to_string()));
    }
    Ok(columns)
}

/// Read a column value as a String, trying multiple DuckDB types.
///
/// DuckDB integer columns return an error for `Option<String>`, so we try
/// String -> i64 -> f64 -> bool. NULL yields `None`.
fn get_column_as_string(row: &duckdb::Row<'_>, idx: usize) -> Option<String> {
    if let Ok(s) = row.get::<_, Option<String>>(idx) {
        return s;
    }
    if let Ok(n) = row.get::<_, Option<i64>>(idx) {
        return n.map(|n| n.to_string());
    }
    if let Ok(f) = row.get::<_, Option<f64>>(idx) {
        return f.map(|f| f.to_string());
    }
    if let Ok(b) = row.get::<_, Option<bool>>(idx) {
        return b.map(|b| b.to_string());
    }
    None
}

/// First line of a DDL batch, for error messages.
fn summarize(ddl: &str) -> String {
    let first = ddl.trim().lines().next().unwrap_or_default();
    if first.len() > 80 {
        let cut = first
            .char_indices()
            .take_while(|(i, _)| *i < 77)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...", &first[..cut])
    } else {
        first.to_string()
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
