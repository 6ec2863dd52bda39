use super::*;
use tempfile::TempDir;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.migrations_path, "db/migrate");
    assert_eq!(config.extension(), "sql");
    assert_eq!(config.database.path, "cfmigrate.duckdb");
    assert_eq!(config.ledger.table, "schema_migrations");
    assert_eq!(config.ledger.legacy_table, "migrations_metadata");
    assert_eq!(config.ledger.partition, "migration");
    assert_eq!(config.rollback, RollbackStrategy::HighWaterMark);
    config.validate().unwrap();
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
migrations_path: schema/changes
extension: cql
database:
  path: "./store.duckdb"
ledger:
  table: applied_changes
  legacy_table: old_metadata
rollback: applied_only
targets:
  prod:
    database:
      path: "/var/lib/store/prod.duckdb"
  ci: {}
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.extension(), "cql");
    assert_eq!(config.ledger.table, "applied_changes");
    assert_eq!(config.rollback, RollbackStrategy::AppliedOnly);
    assert_eq!(
        config.migrations_path_absolute(Path::new("/srv/app")),
        PathBuf::from("/srv/app/schema/changes")
    );
    assert_eq!(config.available_targets(), vec!["ci", "prod"]);
}

#[test]
fn test_database_for_target() {
    let yaml = r#"
database:
  path: dev.duckdb
targets:
  prod:
    database:
      path: prod.duckdb
  ci: {}
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.database_for(None).unwrap().path, "dev.duckdb");
    assert_eq!(config.database_for(Some("prod")).unwrap().path, "prod.duckdb");
    assert_eq!(config.database_for(Some("ci")).unwrap().path, "dev.duckdb");

    let err = config.database_for(Some("staging")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("[C003]"));
    assert!(msg.contains("ci, prod"));
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("migration_dir: x");
    assert!(result.is_err());
}

#[test]
fn test_validate_rejects_bad_table_names() {
    let mut config = Config::default();
    config.ledger.table = "schema migrations; DROP".to_string();
    assert!(matches!(
        config.validate(),
        Err(CoreError::ConfigInvalid { .. })
    ));

    let mut config = Config::default();
    config.ledger.legacy_table = "SCHEMA_MIGRATIONS".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_extension() {
    let config = Config {
        extension: ".".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_rollback_strategy_display() {
    assert_eq!(RollbackStrategy::HighWaterMark.to_string(), "high_water_mark");
    assert_eq!(RollbackStrategy::AppliedOnly.to_string(), "applied_only");
}

#[test]
fn test_load_from_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("cfmigrate.yaml"),
        "migrations_path: migrations\n",
    )
    .unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.migrations_path, "migrations");
}

#[test]
fn test_load_missing_config() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_invalid_yaml() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("cfmigrate.yml"), "ledger: [not, a, map]\n").unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
}
