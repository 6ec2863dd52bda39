//! cfm-core - Core library for cfmigrate
//!
//! This crate provides the shared migration types, the `<version>_<name>`
//! naming convention, catalog discovery, and configuration parsing used by
//! the ledger, the migrator, and the CLI.

pub mod catalog;
pub mod config;
pub mod error;
pub mod naming;
pub mod script_name;
pub mod version;

pub use catalog::{Catalog, MigrationIdentifier, ScriptLookup};
pub use config::{Config, DatabaseConfig, LedgerConfig, RollbackStrategy};
pub use error::{CoreError, CoreResult};
pub use naming::{camelize, parse_source_name, ParsedSource};
pub use script_name::ScriptName;
pub use version::MigrationVersion;
