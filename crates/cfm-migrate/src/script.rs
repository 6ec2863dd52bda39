//! Migration script capability.

use async_trait::async_trait;
use cfm_db::Store;
use std::fmt;

/// Direction a script is run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One versioned unit of schema change.
///
/// The store is handed in on every call; scripts hold no connection of
/// their own.
#[async_trait]
pub trait MigrationScript: Send + Sync {
    /// Bring the schema forward.
    async fn apply(&self, store: &dyn Store) -> anyhow::Result<()>;

    /// Undo what [`apply`](Self::apply) did.
    async fn revert(&self, store: &dyn Store) -> anyhow::Result<()>;
}
