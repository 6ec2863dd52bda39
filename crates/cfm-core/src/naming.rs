//! Migration source naming convention.
//!
//! A migration source is named `<decimal-version>_<descriptive_name>.<ext>`,
//! e.g. `20240105120000_create_users.sql`. The descriptive name is converted
//! to the script's registry key with [`camelize`].

use crate::error::{CoreError, CoreResult};
use crate::script_name::ScriptName;
use crate::version::MigrationVersion;
use std::path::Path;

/// A source name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    pub version: MigrationVersion,
    /// Descriptive part of the name, as written (`create_users`).
    pub name: String,
    /// Registry key derived from `name` (`CreateUsers`).
    pub script: ScriptName,
}

/// Parse a source identifier (a path or bare file name) into its parts.
///
/// Only the last path component is considered.
pub fn parse_source_name(source: &str, extension: &str) -> CoreResult<ParsedSource> {
    let file_name = Path::new(source)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(source);

    let suffix = format!(".{extension}");
    let stem = file_name
        .strip_suffix(&suffix)
        .ok_or_else(|| CoreError::InvalidName {
            source_name: source.to_string(),
            reason: format!("expected a '{suffix}' file"),
        })?;

    let (prefix, name) = stem
        .split_once('_')
        .ok_or_else(|| CoreError::MissingVersion {
            source_name: source.to_string(),
        })?;

    let version: MigrationVersion = prefix.parse().map_err(|_| CoreError::MissingVersion {
        source_name: source.to_string(),
    })?;

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::InvalidName {
            source_name: source.to_string(),
            reason: "descriptive name may only contain letters, digits and underscores"
                .to_string(),
        });
    }

    let script = camelize(name).ok_or_else(|| CoreError::InvalidName {
        source_name: source.to_string(),
        reason: "descriptive name is empty".to_string(),
    })?;

    Ok(ParsedSource {
        version,
        name: name.to_string(),
        script,
    })
}

/// Convert a snake_case descriptive name to its script name.
///
/// Empty segments are dropped; returns `None` when nothing is left.
pub fn camelize(snake: &str) -> Option<ScriptName> {
    let camel: String = snake
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    ScriptName::try_new(camel)
}

#[cfg(test)]
#[path = "naming_test.rs"]
mod tests;
