//! Migration scripts read from SQL files.
//!
//! A file holds an up section and an optional down section:
//!
//! ```sql
//! -- migrate:up
//! CREATE TABLE users (id VARCHAR PRIMARY KEY);
//!
//! -- migrate:down
//! DROP TABLE users;
//! ```
//!
//! Text before the first marker belongs to the up section. Each section is
//! sent to the store as one batch.

use crate::error::MigrateResult;
use crate::script::MigrationScript;
use async_trait::async_trait;
use cfm_core::CoreError;
use cfm_db::Store;
use std::path::Path;

const UP_MARKER: &str = "-- migrate:up";
const DOWN_MARKER: &str = "-- migrate:down";

/// Migration script backed by a SQL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScript {
    source: String,
    up: String,
    down: String,
}

impl SqlScript {
    /// Split `text` into its up and down sections.
    pub fn parse(source: impl Into<String>, text: &str) -> Self {
        let mut up = String::new();
        let mut down = String::new();
        let mut in_down = false;

        for line in text.lines() {
            let marker = line.trim();
            if marker.eq_ignore_ascii_case(UP_MARKER) {
                in_down = false;
                continue;
            }
            if marker.eq_ignore_ascii_case(DOWN_MARKER) {
                in_down = true;
                continue;
            }
            let section = if in_down { &mut down } else { &mut up };
            section.push_str(line);
            section.push('\n');
        }

        Self {
            source: source.into(),
            up: up.trim().to_string(),
            down: down.trim().to_string(),
        }
    }

    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> MigrateResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::parse(path.display().to_string(), &text))
    }

    pub fn up_sql(&self) -> &str {
        &self.up
    }

    pub fn down_sql(&self) -> &str {
        &self.down
    }

    pub fn is_reversible(&self) -> bool {
        !self.down.is_empty()
    }
}

#[async_trait]
impl MigrationScript for SqlScript {
    async fn apply(&self, store: &dyn Store) -> anyhow::Result<()> {
        if self.up.is_empty() {
            log::warn!("{} has an empty up section", self.source);
            return Ok(());
        }
        store.execute(&self.up).await?;
        Ok(())
    }

    async fn revert(&self, store: &dyn Store) -> anyhow::Result<()> {
        if !self.is_reversible() {
            anyhow::bail!("{} has no '{DOWN_MARKER}' section and cannot be reverted", self.source);
        }
        store.execute(&self.down).await?;
        Ok(())
    }
}
