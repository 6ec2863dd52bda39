//! Strongly-typed migration version.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric version extracted from a migration's source name.
///
/// Versions are totally ordered by their numeric value, so `0010` and `10`
/// name the same migration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MigrationVersion(u64);

impl MigrationVersion {
    /// Version reported for an empty ledger.
    pub const ZERO: MigrationVersion = MigrationVersion(0);

    pub fn new(version: u64) -> Self {
        Self(version)
    }

    /// Return the numeric value.
    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MigrationVersion {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Error returned when a string is not a decimal version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError(String);

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a decimal migration version", self.0)
    }
}

impl std::error::Error for ParseVersionError {}

impl FromStr for MigrationVersion {
    type Err = ParseVersionError;

    /// Accepts ASCII decimal digits only; signs, whitespace and overflow are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseVersionError(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ParseVersionError(s.to_string()))
    }
}
