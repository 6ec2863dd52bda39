//! Migrator: applies pending migrations and rolls back applied ones.
//!
//! Every step runs the script to completion and then updates the ledger;
//! the ledger write is the step's commit point. The first failing step
//! stops the run and leaves that version's ledger state unchanged.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{Ledger, LedgerTables};
use crate::registry::ScriptRegistry;
use crate::script::Direction;
use cfm_core::{Catalog, MigrationIdentifier, MigrationVersion, RollbackStrategy};
use cfm_db::Store;
use std::path::Path;
use std::sync::Arc;

/// Applied/pending state of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: MigrationVersion,
    pub name: String,
    pub script: String,
    pub applied: bool,
}

/// Runs migrations from a [`Catalog`] against a [`Store`].
pub struct Migrator {
    store: Arc<dyn Store>,
    catalog: Catalog,
    registry: ScriptRegistry,
    ledger: Ledger,
    rollback_strategy: RollbackStrategy,
}

impl Migrator {
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Catalog,
        registry: ScriptRegistry,
        tables: LedgerTables,
    ) -> MigrateResult<Self> {
        let ledger = Ledger::new(Arc::clone(&store), catalog.versions(), tables)?;
        Ok(Self {
            store,
            catalog,
            registry,
            ledger,
            rollback_strategy: RollbackStrategy::default(),
        })
    }

    /// Build the catalog from `dir`, resolving names against `registry`.
    pub fn discover(
        store: Arc<dyn Store>,
        dir: &Path,
        extension: &str,
        registry: ScriptRegistry,
        tables: LedgerTables,
    ) -> MigrateResult<Self> {
        let catalog = Catalog::discover(dir, extension, &registry)?;
        Self::new(store, catalog, registry, tables)
    }

    pub fn with_rollback_strategy(mut self, strategy: RollbackStrategy) -> Self {
        self.rollback_strategy = strategy;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn rollback_strategy(&self) -> RollbackStrategy {
        self.rollback_strategy
    }

    /// Catalog entries not recorded in the ledger, ascending.
    pub async fn pending(&self) -> MigrateResult<Vec<&MigrationIdentifier>> {
        let applied = self.ledger.read_applied().await?;
        Ok(self
            .catalog
            .iter()
            .filter(|id| !applied.contains(&id.version))
            .collect())
    }

    /// Apply every pending migration in ascending order.
    ///
    /// Returns the number applied.
    pub async fn up_to_latest(&self) -> MigrateResult<usize> {
        let pending = self.pending().await?;
        if pending.is_empty() {
            log::info!("No pending migrations");
            return Ok(0);
        }

        log::info!("Applying {} pending migration(s)", pending.len());
        let mut applied = 0;
        for id in pending {
            self.run_step(id, Direction::Up).await?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Migrations a rollback would revert, in the order it would revert them.
    pub async fn rollback_candidates(&self) -> MigrateResult<Vec<&MigrationIdentifier>> {
        let applied = self.ledger.read_applied().await?;
        let candidates = match self.rollback_strategy {
            RollbackStrategy::HighWaterMark => {
                // An empty ledger has a high-water mark of version 0.
                let high = applied.last().copied().unwrap_or(MigrationVersion::ZERO);
                self.catalog
                    .iter()
                    .rev()
                    .filter(|id| id.version <= high)
                    .collect()
            }
            RollbackStrategy::AppliedOnly => self
                .catalog
                .iter()
                .rev()
                .filter(|id| applied.contains(&id.version))
                .collect(),
        };
        Ok(candidates)
    }

    /// Revert up to `count` migrations, newest first.
    ///
    /// Returns the number reverted.
    pub async fn rollback(&self, count: usize) -> MigrateResult<usize> {
        if count == 0 {
            return Ok(0);
        }
        let candidates = self.rollback_candidates().await?;
        let selected: Vec<&MigrationIdentifier> = candidates.into_iter().take(count).collect();
        if selected.is_empty() {
            log::info!("Nothing to roll back");
            return Ok(0);
        }

        log::info!("Rolling back {} migration(s)", selected.len());
        let mut reverted = 0;
        for id in selected {
            self.run_step(id, Direction::Down).await?;
            reverted += 1;
        }
        Ok(reverted)
    }

    /// Applied/pending state of every catalog entry, ascending.
    pub async fn status(&self) -> MigrateResult<Vec<MigrationStatus>> {
        let applied = self.ledger.read_applied().await?;
        Ok(self
            .catalog
            .iter()
            .map(|id| MigrationStatus {
                version: id.version,
                name: id.name.clone(),
                script: id.script.to_string(),
                applied: applied.contains(&id.version),
            })
            .collect())
    }

    /// Highest applied version (the high-water mark).
    pub async fn current_version(&self) -> MigrateResult<MigrationVersion> {
        self.ledger.highest_applied().await
    }

    async fn run_step(&self, id: &MigrationIdentifier, direction: Direction) -> MigrateResult<()> {
        log::info!("Migrating {direction}: {} {}", id.version, id.name);
        let script = self.registry.resolve(&id.script)?;

        let outcome = match direction {
            Direction::Up => script.apply(self.store.as_ref()).await,
            Direction::Down => script.revert(self.store.as_ref()).await,
        };
        outcome.map_err(|source| MigrateError::Script {
            version: id.version,
            script: id.script.to_string(),
            direction,
            source,
        })?;

        match direction {
            Direction::Up => self.ledger.mark_applied(id.version).await,
            Direction::Down => self.ledger.mark_reverted(id.version).await,
        }
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
