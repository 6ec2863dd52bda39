//! Runtime context for CLI commands

use anyhow::{Context, Result};
use cfm_core::{Config, CoreError};
use cfm_db::{DuckDbStore, Store};
use cfm_migrate::{LedgerTables, Migrator, ScriptRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Loaded configuration plus the project root it is relative to
pub(crate) struct RuntimeContext {
    /// Project root directory
    pub root: PathBuf,

    /// Resolved configuration
    pub config: Config,
}

impl RuntimeContext {
    /// Load configuration from `--config` or the project directory.
    ///
    /// A project directory without a config file runs on defaults; an
    /// explicit `--config` path must exist.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);

        let config = match &args.config {
            Some(config_path) => {
                Config::load(Path::new(config_path)).context("Failed to load configuration file")?
            }
            None => match Config::load_from_dir(&root) {
                Ok(config) => config,
                Err(CoreError::ConfigNotFound { path }) => {
                    log::debug!("No config at {path}, using defaults");
                    Config::default()
                }
                Err(e) => return Err(e).context("Failed to load project configuration"),
            },
        };

        Ok(Self { root, config })
    }

    /// Directory holding the migration files
    pub fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_path_absolute(&self.root)
    }

    /// Database path selected by `--database`, `--target`, or the config
    pub fn database_path(&self, args: &GlobalArgs) -> Result<String> {
        let path = match &args.database {
            Some(path) => path.clone(),
            None => self
                .config
                .database_for(args.target.as_deref())
                .context("Failed to resolve target")?
                .path
                .clone(),
        };
        Ok(self.resolve_db_path(&path))
    }

    /// Open the store selected by `--database`, `--target`, or the config
    pub fn open_store(&self, args: &GlobalArgs) -> Result<Arc<dyn Store>> {
        let db_path = self.database_path(args)?;
        if db_path == ":memory:" {
            log::warn!("Using an in-memory database; nothing is kept after this run");
        }
        log::debug!("Opening database {db_path}");
        let store = DuckDbStore::new(&db_path).context("Failed to connect to database")?;
        Ok(Arc::new(store))
    }

    /// Relative database paths are relative to the project root
    fn resolve_db_path(&self, path: &str) -> String {
        if path == ":memory:" || Path::new(path).is_absolute() {
            path.to_string()
        } else {
            self.root.join(path).display().to_string()
        }
    }

    /// Build a migrator over the SQL migrations in the project
    pub fn migrator(&self, args: &GlobalArgs) -> Result<Migrator> {
        let dir = self.migrations_dir();
        let extension = self.config.extension();
        let registry = ScriptRegistry::from_sql_dir(&dir, extension)
            .with_context(|| format!("Failed to load migrations from {}", dir.display()))?;
        let store = self.open_store(args)?;
        let migrator = Migrator::discover(
            store,
            &dir,
            extension,
            registry,
            LedgerTables::from(self.config.ledger.clone()),
        )
        .context("Failed to build migration catalog")?
        .with_rollback_strategy(self.config.rollback);
        Ok(migrator)
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
