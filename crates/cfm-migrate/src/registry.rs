//! Script registry: maps a script name to a factory for its script.

use crate::error::{MigrateError, MigrateResult};
use crate::script::MigrationScript;
use crate::sql_script::SqlScript;
use cfm_core::catalog::list_sources;
use cfm_core::{parse_source_name, ScriptLookup, ScriptName};
use std::collections::HashMap;
use std::path::Path;

/// Builds a fresh script instance for one run step.
pub type ScriptFactory = Box<dyn Fn() -> Box<dyn MigrationScript> + Send + Sync>;

/// Registered migration scripts, keyed by [`ScriptName`].
#[derive(Default)]
pub struct ScriptRegistry {
    factories: HashMap<ScriptName, ScriptFactory>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`.
    pub fn register<F>(&mut self, name: impl AsRef<str>, factory: F) -> MigrateResult<()>
    where
        F: Fn() -> Box<dyn MigrationScript> + Send + Sync + 'static,
    {
        let name = ScriptName::try_new(name.as_ref()).ok_or(MigrateError::EmptyScriptName)?;
        if self.factories.contains_key(&name) {
            return Err(MigrateError::DuplicateScript(name.to_string()));
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Register a script type constructed with `Default`.
    pub fn register_default<T>(&mut self, name: impl AsRef<str>) -> MigrateResult<()>
    where
        T: MigrationScript + Default + 'static,
    {
        self.register(name, || Box::new(T::default()))
    }

    /// Build the script registered under `name`.
    pub fn resolve(&self, name: &str) -> MigrateResult<Box<dyn MigrationScript>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| MigrateError::ScriptNotRegistered(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(ScriptName::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Register one [`SqlScript`] per `<version>_<name>.<extension>` file in
    /// `dir`, under the file's script name.
    ///
    /// Files that do not follow the naming convention are not registered;
    /// the catalog reports them when it is built from the same directory.
    pub fn from_sql_dir(dir: &Path, extension: &str) -> MigrateResult<Self> {
        let mut registry = Self::new();
        for source in list_sources(dir, extension)? {
            let parsed = match parse_source_name(&source, extension) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::debug!("Not registering {source}: {e}");
                    continue;
                }
            };
            let script = SqlScript::load(Path::new(&source))?;
            registry.register(parsed.script, move || Box::new(script.clone()))?;
        }
        log::debug!(
            "Registered {} SQL migration script(s) from {}",
            registry.len(),
            dir.display()
        );
        Ok(registry)
    }
}

impl ScriptLookup for ScriptRegistry {
    fn contains(&self, name: &ScriptName) -> bool {
        self.factories.contains_key(name)
    }
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("scripts", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
