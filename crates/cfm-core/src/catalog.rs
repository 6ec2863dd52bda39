//! Migration catalog: the ordered set of available migrations.
//!
//! The catalog is built once per run from a listing of source names. Every
//! name must follow the naming convention and resolve to a registered
//! script; the first violation aborts the whole build.

use crate::error::{CoreError, CoreResult};
use crate::naming::parse_source_name;
use crate::script_name::ScriptName;
use crate::version::MigrationVersion;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Something that knows which migration scripts exist.
pub trait ScriptLookup {
    /// Whether a script is registered under `name`.
    fn contains(&self, name: &ScriptName) -> bool;
}

impl ScriptLookup for HashSet<ScriptName> {
    fn contains(&self, name: &ScriptName) -> bool {
        HashSet::contains(self, name)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationIdentifier {
    pub version: MigrationVersion,
    /// Descriptive name from the source (`create_users`).
    pub name: String,
    /// Registry key of the script implementing this migration.
    pub script: ScriptName,
    /// The source identifier this entry was parsed from.
    pub source: String,
}

/// Catalog of migrations, ascending by version.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<MigrationIdentifier>,
}

impl Catalog {
    /// Build a catalog from source names in any order.
    pub fn from_sources<I, S>(
        sources: I,
        extension: &str,
        lookup: &dyn ScriptLookup,
    ) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_version: BTreeMap<MigrationVersion, MigrationIdentifier> = BTreeMap::new();

        for source in sources {
            let source = source.as_ref();
            let parsed = parse_source_name(source, extension)?;

            if !lookup.contains(&parsed.script) {
                return Err(CoreError::UnresolvedScript {
                    source_name: source.to_string(),
                    script: parsed.script.to_string(),
                });
            }

            if let Some(existing) = by_version.get(&parsed.version) {
                // Report the pair in a stable order regardless of listing order.
                let (first, second) = if existing.source.as_str() <= source {
                    (existing.source.clone(), source.to_string())
                } else {
                    (source.to_string(), existing.source.clone())
                };
                return Err(CoreError::DuplicateVersion {
                    version: parsed.version.get(),
                    first,
                    second,
                });
            }

            by_version.insert(
                parsed.version,
                MigrationIdentifier {
                    version: parsed.version,
                    name: parsed.name,
                    script: parsed.script,
                    source: source.to_string(),
                },
            );
        }

        Ok(Self {
            entries: by_version.into_values().collect(),
        })
    }

    /// Discover migrations in `dir` (non-recursive).
    ///
    /// Only regular files ending in `.<extension>` are considered; dot-files
    /// are skipped.
    pub fn discover(dir: &Path, extension: &str, lookup: &dyn ScriptLookup) -> CoreResult<Self> {
        let sources = list_sources(dir, extension)?;
        log::debug!(
            "Discovered {} migration source(s) in {}",
            sources.len(),
            dir.display()
        );
        Self::from_sources(sources, extension, lookup)
    }

    /// All entries, ascending by version.
    pub fn list(&self) -> &[MigrationIdentifier] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationIdentifier> {
        self.entries.iter()
    }

    /// All versions, ascending.
    pub fn versions(&self) -> Vec<MigrationVersion> {
        self.entries.iter().map(|e| e.version).collect()
    }

    pub fn get(&self, version: MigrationVersion) -> Option<&MigrationIdentifier> {
        self.entries
            .binary_search_by_key(&version, |e| e.version)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// List the paths of candidate migration files in `dir`, sorted by file name.
pub fn list_sources(dir: &Path, extension: &str) -> CoreResult<Vec<String>> {
    let io_err = |e: std::io::Error| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    };

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            log::warn!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        sources.push(path.display().to_string());
    }
    sources.sort();
    Ok(sources)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
