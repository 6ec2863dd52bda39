use super::*;
use crate::error::ErrorKind;
use async_trait::async_trait;
use cfm_db::{DbError, DbResult, DuckDbStore};
use std::sync::atomic::{AtomicUsize, Ordering};

fn v(n: u64) -> MigrationVersion {
    MigrationVersion::new(n)
}

fn versions(ns: &[u64]) -> BTreeSet<MigrationVersion> {
    ns.iter().copied().map(v).collect()
}

fn store() -> Arc<dyn Store> {
    Arc::new(DuckDbStore::in_memory().unwrap())
}

fn ledger_over(store: &Arc<dyn Store>, known: &[u64]) -> Ledger {
    Ledger::new(
        Arc::clone(store),
        known.iter().copied().map(v).collect(),
        LedgerTables::default(),
    )
    .unwrap()
}

/// Delegates to another store but fails its `fail_on`-th write.
struct FailingWrites {
    inner: Arc<dyn Store>,
    writes: AtomicUsize,
    fail_on: usize,
}

impl FailingWrites {
    fn over(inner: &Arc<dyn Store>, fail_on: usize) -> Arc<dyn Store> {
        Arc::new(Self {
            inner: Arc::clone(inner),
            writes: AtomicUsize::new(0),
            fail_on,
        })
    }
}

#[async_trait]
impl Store for FailingWrites {
    async fn select(
        &self,
        table: &str,
        criteria: &Criteria,
        projection: &[&str],
    ) -> DbResult<Vec<Row>> {
        self.inner.select(table, criteria, projection).await
    }

    async fn write(&self, table: &str, row: &Row) -> DbResult<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            return Err(DbError::ExecutionError {
                operation: "write",
                target: table.to_string(),
                message: "connection reset".to_string(),
            });
        }
        self.inner.write(table, row).await
    }

    async fn delete(&self, table: &str, criteria: &Criteria) -> DbResult<()> {
        self.inner.delete(table, criteria).await
    }

    async fn execute(&self, ddl: &str) -> DbResult<()> {
        self.inner.execute(ddl).await
    }

    fn db_type(&self) -> &'static str {
        "failing-writes"
    }
}

async fn seed_legacy(store: &Arc<dyn Store>, value: &str) {
    let tables = LedgerTables::default();
    store
        .execute(&ddl::create_legacy_table(&tables.legacy_table))
        .await
        .unwrap();
    let row: Row = [
        (LEGACY_NAME_COLUMN.to_string(), LEGACY_VERSION_KEY.to_string()),
        (LEGACY_VALUE_COLUMN.to_string(), value.to_string()),
    ]
    .into_iter()
    .collect();
    store.write(&tables.legacy_table, &row).await.unwrap();
}

async fn table_exists(store: &Arc<dyn Store>, table: &str) -> bool {
    match store.select(table, &Criteria::new(), &[]).await {
        Ok(_) => true,
        Err(e) if e.is_table_not_found() => false,
        Err(e) => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
async fn test_fresh_store_creates_empty_ledger() {
    let store = store();
    let ledger = ledger_over(&store, &[1, 2, 3]);

    assert!(ledger.read_applied().await.unwrap().is_empty());
    assert!(table_exists(&store, "schema_migrations").await);
    assert_eq!(ledger.highest_applied().await.unwrap(), MigrationVersion::ZERO);
}

#[tokio::test]
async fn test_mark_applied_and_reverted() {
    let store = store();
    let ledger = ledger_over(&store, &[1, 2, 3]);

    ledger.mark_applied(v(1)).await.unwrap();
    ledger.mark_applied(v(3)).await.unwrap();
    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[1, 3]));
    assert_eq!(ledger.highest_applied().await.unwrap(), v(3));

    ledger.mark_reverted(v(3)).await.unwrap();
    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[1]));
}

#[tokio::test]
async fn test_marks_are_idempotent() {
    let store = store();
    let ledger = ledger_over(&store, &[1, 2]);

    ledger.mark_applied(v(2)).await.unwrap();
    ledger.mark_applied(v(2)).await.unwrap();
    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[2]));

    ledger.mark_reverted(v(2)).await.unwrap();
    ledger.mark_reverted(v(2)).await.unwrap();
    ledger.mark_reverted(v(7)).await.unwrap();
    assert!(ledger.read_applied().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_apply_then_revert_round_trip() {
    let store = store();
    let ledger = ledger_over(&store, &[1, 2, 3]);
    ledger.mark_applied(v(1)).await.unwrap();
    let before = ledger.read_applied().await.unwrap();

    for n in [1, 2, 3] {
        if before.contains(&v(n)) {
            continue;
        }
        ledger.mark_applied(v(n)).await.unwrap();
        ledger.mark_reverted(v(n)).await.unwrap();
        assert_eq!(ledger.read_applied().await.unwrap(), before);
    }
}

#[tokio::test]
async fn test_highest_applied_is_high_water_mark_not_contiguous() {
    let store = store();
    let ledger = ledger_over(&store, &[1, 2, 10]);
    ledger.mark_applied(v(10)).await.unwrap();
    assert_eq!(ledger.highest_applied().await.unwrap(), v(10));
    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[10]));
}

#[tokio::test]
async fn test_versions_ordered_numerically() {
    let store = store();
    let ledger = ledger_over(&store, &[]);
    for n in [9, 10, 100, 2] {
        ledger.mark_applied(v(n)).await.unwrap();
    }
    let applied: Vec<u64> = ledger
        .read_applied()
        .await
        .unwrap()
        .into_iter()
        .map(MigrationVersion::get)
        .collect();
    assert_eq!(applied, vec![2, 9, 10, 100]);
    assert_eq!(ledger.highest_applied().await.unwrap(), v(100));
}

#[tokio::test]
async fn test_legacy_upgrade_backfills_and_discards_legacy() {
    let store = store();
    seed_legacy(&store, "3").await;
    let ledger = ledger_over(&store, &[1, 2, 3, 4, 5]);

    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[1, 2, 3]));
    assert!(!table_exists(&store, "migrations_metadata").await);

    // A second read goes straight to the ledger table: reverting 2 must stick.
    ledger.mark_reverted(v(2)).await.unwrap();
    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[1, 3]));
}

#[tokio::test]
async fn test_interrupted_backfill_is_resumed_by_next_read() {
    let store = store();
    seed_legacy(&store, "3").await;

    let flaky = FailingWrites::over(&store, 2);
    let interrupted = Ledger::new(flaky, (1..=5).map(v).collect(), LedgerTables::default()).unwrap();
    let err = interrupted.read_applied().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Store);
    assert!(table_exists(&store, "schema_migrations").await);
    assert!(table_exists(&store, "migrations_metadata").await);

    let ledger = ledger_over(&store, &[1, 2, 3, 4, 5]);
    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[1, 2, 3]));
    assert!(!table_exists(&store, "migrations_metadata").await);

    // Finished: the legacy value no longer feeds later reads.
    ledger.mark_reverted(v(3)).await.unwrap();
    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[1, 2]));
}

#[tokio::test]
async fn test_upgrade_interrupted_before_backfill_is_resumed() {
    let store = store();
    seed_legacy(&store, "2").await;
    store
        .execute(&ddl::create_ledger_table("schema_migrations"))
        .await
        .unwrap();

    let ledger = ledger_over(&store, &[1, 2, 3]);
    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[1, 2]));
    assert!(!table_exists(&store, "migrations_metadata").await);
}

#[tokio::test]
async fn test_legacy_upgrade_only_backfills_known_versions() {
    let store = store();
    seed_legacy(&store, "20").await;
    let ledger = ledger_over(&store, &[5, 10, 30]);

    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[5, 10]));
    assert_eq!(ledger.highest_applied().await.unwrap(), v(10));
}

#[tokio::test]
async fn test_legacy_zero_discards_legacy_without_backfill() {
    let store = store();
    seed_legacy(&store, "0").await;
    let ledger = ledger_over(&store, &[1, 2]);

    assert!(ledger.read_applied().await.unwrap().is_empty());
    assert!(!table_exists(&store, "migrations_metadata").await);
}

#[tokio::test]
async fn test_legacy_table_without_version_entry_is_left_alone() {
    let store = store();
    let tables = LedgerTables::default();
    store
        .execute(&ddl::create_legacy_table(&tables.legacy_table))
        .await
        .unwrap();
    let ledger = ledger_over(&store, &[1, 2]);

    assert!(ledger.read_applied().await.unwrap().is_empty());
    assert!(table_exists(&store, "migrations_metadata").await);
}

#[tokio::test]
async fn test_corrupt_legacy_value_is_store_error() {
    let store = store();
    seed_legacy(&store, "three").await;
    let ledger = ledger_over(&store, &[1, 2, 3]);

    let err = ledger.read_applied().await.unwrap_err();
    assert!(matches!(err, MigrateError::CorruptLedger { .. }), "got {err}");
    assert_eq!(err.kind(), ErrorKind::Store);
    // Nothing was created or discarded, so a later run retries the upgrade.
    assert!(table_exists(&store, "migrations_metadata").await);
    assert!(!table_exists(&store, "schema_migrations").await);
}

#[tokio::test]
async fn test_corrupt_ledger_row_is_reported() {
    let store = store();
    let ledger = ledger_over(&store, &[1]);
    ledger.read_applied().await.unwrap();
    store
        .execute("INSERT INTO schema_migrations VALUES ('migration', 'v1')")
        .await
        .unwrap();

    let err = ledger.read_applied().await.unwrap_err();
    assert!(matches!(err, MigrateError::CorruptLedger { .. }));
}

#[tokio::test]
async fn test_partition_isolates_rows() {
    let store = store();
    let ledger = ledger_over(&store, &[1]);
    ledger.read_applied().await.unwrap();
    store
        .execute("INSERT INTO schema_migrations VALUES ('seed', '42')")
        .await
        .unwrap();
    ledger.mark_applied(v(1)).await.unwrap();

    assert_eq!(ledger.read_applied().await.unwrap(), versions(&[1]));
}

#[tokio::test]
async fn test_custom_table_names() {
    let store = store();
    let tables = LedgerTables {
        table: "applied_changes".to_string(),
        legacy_table: "old_meta".to_string(),
        partition: "migration".to_string(),
    };
    let ledger = Ledger::new(Arc::clone(&store), vec![v(1)], tables).unwrap();
    // Writes do not create the ledger table; the first read does.
    ledger.mark_applied(v(1)).await.unwrap_err();

    ledger.read_applied().await.unwrap();
    ledger.mark_applied(v(1)).await.unwrap();
    assert!(table_exists(&store, "applied_changes").await);
    assert!(!table_exists(&store, "schema_migrations").await);
}

#[test]
fn test_invalid_table_name_rejected() {
    let tables = LedgerTables {
        table: "bad name".to_string(),
        ..LedgerTables::default()
    };
    let err = match Ledger::new(store(), vec![], tables) {
        Ok(_) => panic!("expected invalid table name to be rejected"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::Config);
}
