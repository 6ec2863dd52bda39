//! DDL for the ledger tables.
//!
//! Table names are validated as plain identifiers before they reach these
//! helpers (see [`crate::ledger::LedgerTables::validate`]).

pub(crate) const TYPE_COLUMN: &str = "type";
pub(crate) const VERSION_COLUMN: &str = "version";

pub(crate) const LEGACY_NAME_COLUMN: &str = "data_name";
pub(crate) const LEGACY_VALUE_COLUMN: &str = "data_value";
pub(crate) const LEGACY_VERSION_KEY: &str = "version";

/// Per-version ledger, one row per applied migration, keyed by (type, version).
pub(crate) fn create_ledger_table(table: &str) -> String {
    format!(
        "CREATE TABLE \"{table}\" (
             \"{TYPE_COLUMN}\"    VARCHAR NOT NULL,
             \"{VERSION_COLUMN}\" VARCHAR NOT NULL,
             PRIMARY KEY (\"{TYPE_COLUMN}\", \"{VERSION_COLUMN}\")
         )"
    )
}

pub(crate) fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS \"{table}\"")
}

/// Legacy single-value table, as written by deployments that predate the
/// per-version ledger. Only used to seed fixtures.
#[cfg(test)]
pub(crate) fn create_legacy_table(table: &str) -> String {
    format!(
        "CREATE TABLE \"{table}\" (
             \"{LEGACY_NAME_COLUMN}\"  VARCHAR PRIMARY KEY,
             \"{LEGACY_VALUE_COLUMN}\" VARCHAR
         )"
    )
}
