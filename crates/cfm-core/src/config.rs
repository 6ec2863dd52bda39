//! Configuration types and parsing for cfmigrate.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main project configuration from cfmigrate.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding `<version>_<name>.<ext>` migration files
    #[serde(default = "default_migrations_path")]
    pub migrations_path: String,

    /// File extension of migration files (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Ledger table names
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// How rollback candidates are selected
    #[serde(default)]
    pub rollback: RollbackStrategy,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_path: default_migrations_path(),
            extension: default_extension(),
            database: DatabaseConfig::default(),
            ledger: LedgerConfig::default(),
            rollback: RollbackStrategy::default(),
            targets: HashMap::new(),
        }
    }
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (file-based, or `:memory:`); relative to the project root
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Where the ledger lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Per-version ledger table
    #[serde(default = "default_ledger_table")]
    pub table: String,

    /// Single-value table written by older deployments; read once, then dropped
    #[serde(default = "default_legacy_table")]
    pub legacy_table: String,

    /// Partition discriminator stored in the ledger's `type` column
    #[serde(default = "default_partition")]
    pub partition: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            table: default_ledger_table(),
            legacy_table: default_legacy_table(),
            partition: default_partition(),
        }
    }
}

/// Rollback candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStrategy {
    /// Every catalog version at or below the highest applied version,
    /// whether or not it is currently recorded (default)
    #[default]
    HighWaterMark,
    /// Only catalog versions currently recorded in the ledger
    AppliedOnly,
}

impl std::fmt::Display for RollbackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollbackStrategy::HighWaterMark => write!(f, "high_water_mark"),
            RollbackStrategy::AppliedOnly => write!(f, "applied_only"),
        }
    }
}

const DEFAULT_DB_PATH: &str = "cfmigrate.duckdb";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_path() -> String {
    "db/migrate".to_string()
}

fn default_extension() -> String {
    "sql".to_string()
}

fn default_ledger_table() -> String {
    "schema_migrations".to_string()
}

fn default_legacy_table() -> String {
    "migrations_metadata".to_string()
}

fn default_partition() -> String {
    "migration".to_string()
}

/// Plain SQL identifier: letter or underscore, then letters, digits, underscores.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for cfmigrate.yml or cfmigrate.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("cfmigrate.yml");
        let yaml_path = dir.join("cfmigrate.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        let ext = self.extension.trim_start_matches('.');
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::ConfigInvalid {
                message: format!("extension '{}' must be alphanumeric", self.extension),
            });
        }

        for (field, value) in [
            ("ledger.table", &self.ledger.table),
            ("ledger.legacy_table", &self.ledger.legacy_table),
        ] {
            if !is_plain_identifier(value) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{field} '{value}' is not a plain identifier"),
                });
            }
        }

        if self.ledger.table.eq_ignore_ascii_case(&self.ledger.legacy_table) {
            return Err(CoreError::ConfigInvalid {
                message: "ledger.table and ledger.legacy_table must differ".to_string(),
            });
        }

        if self.ledger.partition.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "ledger.partition cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Extension without a leading dot
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    /// Get absolute migrations path relative to a project root
    pub fn migrations_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_path)
    }

    /// Get the list of available target names, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve the database configuration for an optional target name.
    ///
    /// A target without a database override falls back to the base config.
    pub fn database_for(&self, target: Option<&str>) -> CoreResult<&DatabaseConfig> {
        let Some(name) = target else {
            return Ok(&self.database);
        };
        match self.targets.get(name) {
            Some(t) => Ok(t.database.as_ref().unwrap_or(&self.database)),
            None => Err(CoreError::ConfigInvalid {
                message: format!(
                    "Unknown target '{}'. Available targets: [{}]",
                    name,
                    self.available_targets().join(", ")
                ),
            }),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
