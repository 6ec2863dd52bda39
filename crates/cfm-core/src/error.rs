//! Error types for cfm-core

use thiserror::Error;

/// Core error type for cfmigrate
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// N001: Source name lacks a leading decimal version
    #[error("[N001] Migration source '{source_name}' must start with a numeric version prefix followed by '_'")]
    MissingVersion { source_name: String },

    /// N002: Source name has a version but no usable descriptive name
    #[error("[N002] Invalid migration source name '{source_name}': {reason}")]
    InvalidName { source_name: String, reason: String },

    /// N003: Derived script name has no registered migration script
    #[error("[N003] Migration source '{source_name}' maps to script '{script}', which is not registered")]
    UnresolvedScript { source_name: String, script: String },

    /// N004: Two sources share the same version
    #[error("[N004] Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        version: u64,
        first: String,
        second: String,
    },

    /// C004: IO error with file path context
    #[error("[C004] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

impl CoreError {
    /// True for errors raised by the naming convention or catalog resolution.
    pub fn is_naming_error(&self) -> bool {
        matches!(
            self,
            CoreError::MissingVersion { .. }
                | CoreError::InvalidName { .. }
                | CoreError::UnresolvedScript { .. }
                | CoreError::DuplicateVersion { .. }
        )
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
