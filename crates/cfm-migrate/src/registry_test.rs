use super::*;
use async_trait::async_trait;
use cfm_db::Store;
use std::fs;
use tempfile::TempDir;

#[derive(Default)]
struct Noop;

#[async_trait]
impl MigrationScript for Noop {
    async fn apply(&self, _store: &dyn Store) -> anyhow::Result<()> {
        Ok(())
    }

    async fn revert(&self, _store: &dyn Store) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn test_register_and_resolve() {
    let mut registry = ScriptRegistry::new();
    registry.register_default::<Noop>("CreateUsers").unwrap();
    registry
        .register("AddEmail", || Box::new(Noop) as Box<dyn MigrationScript>)
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert!(registry.resolve("CreateUsers").is_ok());
    assert!(ScriptLookup::contains(&registry, &ScriptName::try_new("AddEmail").unwrap()));
    assert_eq!(
        registry.names(),
        vec!["AddEmail", "CreateUsers"]
    );
}

#[test]
fn test_duplicate_registration_rejected() {
    let mut registry = ScriptRegistry::new();
    registry.register_default::<Noop>("CreateUsers").unwrap();
    let err = registry.register_default::<Noop>("CreateUsers").unwrap_err();
    assert!(matches!(err, MigrateError::DuplicateScript(name) if name == "CreateUsers"));
}

#[test]
fn test_empty_name_rejected() {
    let mut registry = ScriptRegistry::new();
    let err = registry.register_default::<Noop>("").unwrap_err();
    assert!(matches!(err, MigrateError::EmptyScriptName));
    assert_eq!(err.kind(), crate::error::ErrorKind::Naming);
    assert!(registry.is_empty());
}

#[test]
fn test_resolve_unknown() {
    let registry = ScriptRegistry::new();
    assert!(registry.is_empty());
    let err = match registry.resolve("Missing") {
        Ok(_) => panic!("expected unknown script to fail"),
        Err(e) => e,
    };
    assert!(matches!(err, MigrateError::ScriptNotRegistered(_)));
}

#[test]
fn test_from_sql_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("1_create_users.sql"),
        "-- migrate:up\nCREATE TABLE users (id VARCHAR PRIMARY KEY);\n-- migrate:down\nDROP TABLE users;\n",
    )
    .unwrap();
    fs::write(dir.path().join("2_add_email.sql"), "SELECT 1;").unwrap();
    fs::write(dir.path().join("abc_create_things.sql"), "SELECT 1;").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a migration").unwrap();

    let registry = ScriptRegistry::from_sql_dir(dir.path(), "sql").unwrap();
    assert_eq!(
        registry.names(),
        vec!["AddEmail", "CreateUsers"]
    );
}

#[test]
fn test_from_sql_dir_rejects_reused_name() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("1_create_users.sql"), "SELECT 1;").unwrap();
    fs::write(dir.path().join("7_create_users.sql"), "SELECT 1;").unwrap();

    let err = ScriptRegistry::from_sql_dir(dir.path(), "sql").unwrap_err();
    assert!(matches!(err, MigrateError::DuplicateScript(_)));
}
