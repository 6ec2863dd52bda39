//! Migration engine for cfmigrate.
//!
//! Applies versioned migration scripts to a store and records which
//! versions are applied in a per-version ledger table. Older deployments
//! that recorded only a single high-water version are upgraded to the
//! per-version ledger the first time the ledger is read.
//!
//! Runs are strictly sequential and provide no mutual exclusion between
//! processes: only one migrator may run against a store at a time.

pub(crate) mod ddl;
pub mod error;
pub mod ledger;
pub mod migrator;
pub mod registry;
pub mod script;
pub mod sql_script;

pub use error::{ErrorKind, MigrateError, MigrateResult};
pub use ledger::{Ledger, LedgerTables};
pub use migrator::{MigrationStatus, Migrator};
pub use registry::{ScriptFactory, ScriptRegistry};
pub use script::{Direction, MigrationScript};
pub use sql_script::SqlScript;
