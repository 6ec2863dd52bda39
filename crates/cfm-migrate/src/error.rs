//! Error types for the migration engine.

use crate::script::Direction;
use cfm_core::{CoreError, MigrationVersion};
use cfm_db::DbError;
use thiserror::Error;

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Naming or configuration error from the catalog (M001).
    #[error("[M001] {0}")]
    Core(#[from] CoreError),

    /// Store failure while reading or writing the ledger (M002).
    #[error("[M002] Ledger {context} failed: {source}")]
    Store {
        context: String,
        #[source]
        source: DbError,
    },

    /// A migration script's apply or revert failed (M003).
    #[error("[M003] Migration {version} ({script}) failed while migrating {direction}: {source:#}")]
    Script {
        version: MigrationVersion,
        script: String,
        direction: Direction,
        #[source]
        source: anyhow::Error,
    },

    /// No script registered under the requested name (M004).
    #[error("[M004] No migration script registered as '{0}'")]
    ScriptNotRegistered(String),

    /// Two scripts registered under one name (M005).
    #[error("[M005] Migration script '{0}' is registered twice")]
    DuplicateScript(String),

    /// A script registered under an empty name (M007).
    #[error("[M007] Migration script name cannot be empty")]
    EmptyScriptName,

    /// Ledger contents that cannot be interpreted (M006).
    #[error("[M006] Corrupt ledger in '{table}': {message}")]
    CorruptLedger { table: String, message: String },
}

/// Coarse classification of a [`MigrateError`] for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Naming,
    Config,
    Store,
    Script,
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Core(e) if e.is_naming_error() => ErrorKind::Naming,
            MigrateError::Core(_) => ErrorKind::Config,
            MigrateError::ScriptNotRegistered(_)
            | MigrateError::DuplicateScript(_)
            | MigrateError::EmptyScriptName => ErrorKind::Naming,
            MigrateError::Store { .. } | MigrateError::CorruptLedger { .. } => ErrorKind::Store,
            MigrateError::Script { .. } => ErrorKind::Script,
        }
    }

    /// Version of the script that failed, if this is a script failure.
    pub fn failed_version(&self) -> Option<MigrationVersion> {
        match self {
            MigrateError::Script { version, .. } => Some(*version),
            _ => None,
        }
    }

    pub(crate) fn store(context: impl Into<String>, source: DbError) -> Self {
        MigrateError::Store {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
