//! cfm-db - Store capability for cfmigrate
//!
//! This crate provides the `Store` trait the ledger and migration scripts
//! talk to, and a DuckDB implementation of it.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbStore;
pub use error::{DbError, DbResult};
pub use traits::{Criteria, Row, Store};
