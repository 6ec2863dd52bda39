//! Ledger store: the durable record of applied migration versions.
//!
//! Each applied version is one `(type, version)` row in the ledger table.
//! Deployments that predate the ledger table recorded only the highest
//! applied version in a single-value legacy table. The first read that
//! finds no ledger table creates it, backfills one row per known version at
//! or below the legacy value, and drops the legacy table. The legacy table
//! is dropped only after the backfill is complete, so a read that finds both
//! tables resumes an interrupted upgrade.

use crate::ddl::{
    self, LEGACY_NAME_COLUMN, LEGACY_VALUE_COLUMN, LEGACY_VERSION_KEY, TYPE_COLUMN, VERSION_COLUMN,
};
use crate::error::{MigrateError, MigrateResult};
use cfm_core::config::{is_plain_identifier, LedgerConfig};
use cfm_core::{CoreError, MigrationVersion};
use cfm_db::{Criteria, Row, Store};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Names of the tables the ledger owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTables {
    pub table: String,
    pub legacy_table: String,
    pub partition: String,
}

impl Default for LedgerTables {
    fn default() -> Self {
        LedgerConfig::default().into()
    }
}

impl From<LedgerConfig> for LedgerTables {
    fn from(config: LedgerConfig) -> Self {
        Self {
            table: config.table,
            legacy_table: config.legacy_table,
            partition: config.partition,
        }
    }
}

impl LedgerTables {
    pub(crate) fn validate(&self) -> MigrateResult<()> {
        for name in [&self.table, &self.legacy_table] {
            if !is_plain_identifier(name) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("ledger table '{name}' is not a plain identifier"),
                }
                .into());
            }
        }
        if self.partition.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "ledger partition cannot be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Contents of the legacy single-value ledger.
enum LegacyState {
    /// No legacy table.
    Absent,
    /// A legacy table without a version entry.
    Unversioned,
    /// The highest version the legacy ledger recorded.
    Value(MigrationVersion),
}

/// Ledger of applied versions, backed by a [`Store`].
pub struct Ledger {
    store: Arc<dyn Store>,
    /// Every version in the catalog; used only to backfill from a legacy value.
    known_versions: Vec<MigrationVersion>,
    tables: LedgerTables,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn Store>,
        known_versions: Vec<MigrationVersion>,
        tables: LedgerTables,
    ) -> MigrateResult<Self> {
        tables.validate()?;
        Ok(Self {
            store,
            known_versions,
            tables,
        })
    }

    pub fn tables(&self) -> &LedgerTables {
        &self.tables
    }

    /// Versions currently recorded as applied.
    ///
    /// Creates the ledger table (and upgrades from the legacy value) when
    /// it does not exist yet. A legacy table that outlived an earlier,
    /// interrupted upgrade is folded in again before the ledger is returned.
    pub async fn read_applied(&self) -> MigrateResult<BTreeSet<MigrationVersion>> {
        let rows = match self
            .store
            .select(&self.tables.table, &self.partition(), &[VERSION_COLUMN])
            .await
        {
            Ok(rows) => rows,
            Err(e) if e.is_table_not_found() => return self.upgrade().await,
            Err(e) => return Err(MigrateError::store(format!("read of '{}'", self.tables.table), e)),
        };

        let mut applied = rows
            .iter()
            .map(|row| self.parse_cell(row, VERSION_COLUMN, &self.tables.table))
            .collect::<MigrateResult<BTreeSet<_>>>()?;

        if let LegacyState::Value(legacy) = self.read_legacy_state().await? {
            log::warn!(
                "Legacy ledger '{}' is still present, resuming its upgrade",
                self.tables.legacy_table
            );
            applied.extend(self.backfill_from_legacy(legacy).await?);
        }
        Ok(applied)
    }

    /// Highest applied version, or [`MigrationVersion::ZERO`] when nothing is
    /// applied. Versions below it need not all be applied.
    pub async fn highest_applied(&self) -> MigrateResult<MigrationVersion> {
        Ok(self
            .read_applied()
            .await?
            .last()
            .copied()
            .unwrap_or(MigrationVersion::ZERO))
    }

    /// Record `version` as applied. Recording it twice is a no-op.
    pub async fn mark_applied(&self, version: MigrationVersion) -> MigrateResult<()> {
        log::debug!("Recording version {version} in '{}'", self.tables.table);
        self.write_entry(version).await
    }

    /// Remove `version` from the ledger. Removing an absent version is a no-op.
    pub async fn mark_reverted(&self, version: MigrationVersion) -> MigrateResult<()> {
        log::debug!("Removing version {version} from '{}'", self.tables.table);
        self.store
            .delete(
                &self.tables.table,
                &self.partition().eq(VERSION_COLUMN, version.to_string()),
            )
            .await
            .map_err(|e| {
                MigrateError::store(
                    format!("delete of version {version} from '{}'", self.tables.table),
                    e,
                )
            })
    }

    fn partition(&self) -> Criteria {
        Criteria::new().eq(TYPE_COLUMN, self.tables.partition.as_str())
    }

    async fn write_entry(&self, version: MigrationVersion) -> MigrateResult<()> {
        let row: Row = [
            (TYPE_COLUMN.to_string(), self.tables.partition.clone()),
            (VERSION_COLUMN.to_string(), version.to_string()),
        ]
        .into_iter()
        .collect();
        self.store
            .write(&self.tables.table, &row)
            .await
            .map_err(|e| {
                MigrateError::store(
                    format!("write of version {version} to '{}'", self.tables.table),
                    e,
                )
            })
    }

    /// One-time conversion from the legacy single-value ledger.
    async fn upgrade(&self) -> MigrateResult<BTreeSet<MigrationVersion>> {
        let table = &self.tables.table;
        // An unreadable legacy value must leave both tables untouched, so it
        // is read before the ledger table is created.
        let legacy = self.read_legacy_state().await?;

        log::info!("Ledger table '{table}' not found, creating it");
        self.store
            .execute(&ddl::create_ledger_table(table))
            .await
            .map_err(|e| MigrateError::store(format!("creation of '{table}'"), e))?;

        match legacy {
            LegacyState::Absent => Ok(BTreeSet::new()),
            LegacyState::Unversioned => {
                log::warn!(
                    "Legacy table '{}' has no version entry; leaving it in place",
                    self.tables.legacy_table
                );
                Ok(BTreeSet::new())
            }
            LegacyState::Value(legacy) => self.backfill_from_legacy(legacy).await,
        }
    }

    /// Record every known version at or below `legacy`, then drop the legacy
    /// table. Safe to repeat: entries already present are left as they are.
    async fn backfill_from_legacy(
        &self,
        legacy: MigrationVersion,
    ) -> MigrateResult<BTreeSet<MigrationVersion>> {
        let backfill: BTreeSet<MigrationVersion> = self
            .known_versions
            .iter()
            .copied()
            .filter(|v| *v <= legacy)
            .collect();
        for version in &backfill {
            self.write_entry(*version).await?;
        }

        // Dropped last: while it exists, a later read finishes the backfill.
        let legacy_table = &self.tables.legacy_table;
        self.store
            .execute(&ddl::drop_table(legacy_table))
            .await
            .map_err(|e| MigrateError::store(format!("drop of '{legacy_table}'"), e))?;

        log::info!(
            "Upgraded legacy ledger '{legacy_table}' (version {legacy}): backfilled {} version(s) into '{}'",
            backfill.len(),
            self.tables.table
        );
        Ok(backfill)
    }

    /// What the legacy ledger holds, if it exists.
    async fn read_legacy_state(&self) -> MigrateResult<LegacyState> {
        let legacy_table = &self.tables.legacy_table;
        let rows = match self
            .store
            .select(
                legacy_table,
                &Criteria::new().eq(LEGACY_NAME_COLUMN, LEGACY_VERSION_KEY),
                &[LEGACY_VALUE_COLUMN],
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) if e.is_table_not_found() => return Ok(LegacyState::Absent),
            Err(e) => return Err(MigrateError::store(format!("read of '{legacy_table}'"), e)),
        };

        match rows.first() {
            Some(row) => self
                .parse_cell(row, LEGACY_VALUE_COLUMN, legacy_table)
                .map(LegacyState::Value),
            None => Ok(LegacyState::Unversioned),
        }
    }

    fn parse_cell(&self, row: &Row, column: &str, table: &str) -> MigrateResult<MigrationVersion> {
        let raw = row.get(column).ok_or_else(|| MigrateError::CorruptLedger {
            table: table.to_string(),
            message: format!("row without a '{column}' value"),
        })?;
        raw.trim()
            .parse()
            .map_err(|e| MigrateError::CorruptLedger {
                table: table.to_string(),
                message: format!("{e}"),
            })
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
