//! Store contract checks shared by the embedded backend tests.
//!
//! Every backend must behave identically from the engine's point of view,
//! so the same assertions run against each of them.

use crate::error::DbError;
use crate::schema::CURRENT_SCHEMA_VERSION;
use crate::traits::{CheckpointScope, Store};
use tm_core::{Checkpoint, Migration};

/// Version 0 metadata layout: no content columns, unique checksums.
/// Valid in both DuckDB and SQLite.
pub(crate) const LEGACY_LAYOUT_SQL: &str = "
    CREATE TABLE tidemark_migrations (
        filename   VARCHAR NOT NULL UNIQUE,
        checksum   VARCHAR NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT current_timestamp
    );
    CREATE TABLE tidemark_checkpoints (
        filename   VARCHAR NOT NULL,
        idx        INTEGER NOT NULL,
        checksum   VARCHAR NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT current_timestamp,
        PRIMARY KEY (filename, idx)
    );
";

pub(crate) async fn prepare(store: &dyn Store) {
    assert_eq!(
        store.ensure_version_table().await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
    store.ensure_migration_table().await.unwrap();
    store.ensure_checkpoint_table().await.unwrap();
}

pub(crate) async fn fresh_database_starts_current(store: &dyn Store) {
    prepare(store).await;
    // Idempotent on a second pass
    prepare(store).await;
    assert!(store.list_migrations().await.unwrap().is_empty());
}

pub(crate) async fn migrations_list_in_numeric_order(store: &dyn Store) {
    prepare(store).await;
    for name in ["10_c.sql", "2_b.sql", "1_a.sql"] {
        store
            .insert_migration(&Migration::new(name, format!("-- {name}")))
            .await
            .unwrap();
    }

    let names: Vec<String> = store
        .list_migrations()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.filename)
        .collect();
    assert_eq!(names, vec!["1_a.sql", "2_b.sql", "10_c.sql"]);
}

pub(crate) async fn insert_rejects_duplicate(store: &dyn Store) {
    prepare(store).await;
    let migration = Migration::new("1_a.sql", "CREATE TABLE a (id INT)");
    store.insert_migration(&migration).await.unwrap();
    assert!(store.insert_migration(&migration).await.is_err());
}

pub(crate) async fn identical_content_is_allowed(store: &dyn Store) {
    prepare(store).await;
    store
        .insert_migration(&Migration::new("1_a.sql", "SELECT 1"))
        .await
        .unwrap();
    store
        .insert_migration(&Migration::new("2_b.sql", "SELECT 1"))
        .await
        .unwrap();
    assert_eq!(store.list_migrations().await.unwrap().len(), 2);
}

pub(crate) async fn upsert_overwrites(store: &dyn Store) {
    prepare(store).await;
    store
        .upsert_migration(&Migration::new("1_a.sql", "old"))
        .await
        .unwrap();
    store
        .upsert_migration(&Migration::new("1_a.sql", "new"))
        .await
        .unwrap();

    let migrations = store.list_migrations().await.unwrap();
    assert_eq!(migrations, vec![Migration::new("1_a.sql", "new")]);
}

pub(crate) async fn checkpoints_round_trip(store: &dyn Store) {
    prepare(store).await;
    let statements = ["CREATE TABLE a (id INT)", "INSERT INTO a VALUES (1)"];
    // Inserted out of order on purpose; listing is by index
    for (idx, stmt) in statements.iter().enumerate().rev() {
        store
            .insert_checkpoint(&Checkpoint::new("1_a.sql", idx, *stmt))
            .await
            .unwrap();
    }
    store
        .insert_checkpoint(&Checkpoint::new("2_b.sql", 0, "SELECT 1"))
        .await
        .unwrap();

    let expected: Vec<String> = statements
        .iter()
        .enumerate()
        .map(|(idx, stmt)| Checkpoint::new("1_a.sql", idx, *stmt).checksum)
        .collect();
    assert_eq!(store.list_checkpoints("1_a.sql").await.unwrap(), expected);

    store
        .delete_checkpoints(CheckpointScope::File("1_a.sql"))
        .await
        .unwrap();
    assert!(store.list_checkpoints("1_a.sql").await.unwrap().is_empty());
    assert_eq!(store.list_checkpoints("2_b.sql").await.unwrap().len(), 1);

    store.delete_checkpoints(CheckpointScope::All).await.unwrap();
    assert!(store.list_checkpoints("2_b.sql").await.unwrap().is_empty());
}

pub(crate) async fn duplicate_checkpoint_rejected(store: &dyn Store) {
    prepare(store).await;
    let checkpoint = Checkpoint::new("1_a.sql", 0, "SELECT 1");
    store.insert_checkpoint(&checkpoint).await.unwrap();
    assert!(store.insert_checkpoint(&checkpoint).await.is_err());
}

pub(crate) async fn complete_migration_is_one_unit(store: &dyn Store) {
    prepare(store).await;
    store
        .insert_checkpoint(&Checkpoint::new("1_a.sql", 0, "SELECT 1"))
        .await
        .unwrap();
    store
        .insert_checkpoint(&Checkpoint::new("2_b.sql", 0, "SELECT 2"))
        .await
        .unwrap();

    let migration = Migration::new("1_a.sql", "SELECT 1;");
    store.complete_migration(&migration).await.unwrap();
    assert!(store.list_checkpoints("1_a.sql").await.unwrap().is_empty());
    assert_eq!(store.list_checkpoints("2_b.sql").await.unwrap().len(), 1);
    assert_eq!(store.list_migrations().await.unwrap(), vec![migration.clone()]);

    // A second completion fails and leaves the new checkpoint in place
    store
        .insert_checkpoint(&Checkpoint::new("1_a.sql", 0, "SELECT 1"))
        .await
        .unwrap();
    assert!(store.complete_migration(&migration).await.is_err());
    assert_eq!(store.list_checkpoints("1_a.sql").await.unwrap().len(), 1);
}

pub(crate) async fn execute_reports_errors(store: &dyn Store) {
    prepare(store).await;
    store.execute("CREATE TABLE widgets (id INTEGER)").await.unwrap();
    store.execute("INSERT INTO widgets VALUES (1)").await.unwrap();
    assert!(store.execute("INSERT INTO no_such_table VALUES (1)").await.is_err());
    assert!(store.execute("NOT EVEN SQL").await.is_err());
}

async fn seed_legacy(store: &dyn Store) {
    store.execute(LEGACY_LAYOUT_SQL).await.unwrap();
    for migration in legacy_history() {
        store
            .execute(&format!(
                "INSERT INTO tidemark_migrations (filename, checksum) VALUES ('{}', '{}')",
                migration.filename, migration.checksum
            ))
            .await
            .unwrap();
    }
}

fn legacy_history() -> Vec<Migration> {
    vec![
        Migration::new("1_a.sql", "CREATE TABLE a (id INT);"),
        Migration::new("2_b.sql", "CREATE TABLE b (id INT);"),
    ]
}

pub(crate) async fn legacy_layout_reports_version_zero(store: &dyn Store) {
    seed_legacy(store).await;
    assert_eq!(store.ensure_version_table().await.unwrap(), 0);
    // Repeated detection does not record a version by itself
    assert_eq!(store.ensure_version_table().await.unwrap(), 0);
}

pub(crate) async fn upgrade_from_v0_fills_content(store: &dyn Store) {
    seed_legacy(store).await;
    assert_eq!(store.ensure_version_table().await.unwrap(), 0);
    store.ensure_migration_table().await.unwrap();
    store.ensure_checkpoint_table().await.unwrap();

    let mut on_disk = legacy_history();
    on_disk.push(Migration::new("3_c.sql", "CREATE TABLE c (id INT);"));
    store.upgrade_schema(0, &on_disk).await.unwrap();

    assert_eq!(
        store.ensure_version_table().await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
    // Only recorded history is carried over, now with content
    assert_eq!(store.list_migrations().await.unwrap(), legacy_history());

    // Checkpoints now carry content and checksums may repeat
    store
        .insert_checkpoint(&Checkpoint::new("3_c.sql", 0, "CREATE TABLE c (id INT)"))
        .await
        .unwrap();
    store
        .insert_migration(&Migration::new("4_d.sql", "CREATE TABLE a (id INT);"))
        .await
        .unwrap();
}

pub(crate) async fn upgrade_keeps_rows_without_files(store: &dyn Store) {
    seed_legacy(store).await;
    store.ensure_version_table().await.unwrap();

    let only_first = &legacy_history()[..1];
    store.upgrade_schema(0, only_first).await.unwrap();

    let migrations = store.list_migrations().await.unwrap();
    assert_eq!(migrations.len(), 2);
    assert_eq!(migrations[0].content, "CREATE TABLE a (id INT);");
    assert_eq!(migrations[1].filename, "2_b.sql");
    assert_eq!(migrations[1].content, "");
    assert_eq!(migrations[1].checksum, legacy_history()[1].checksum);
}

pub(crate) async fn upgrade_blocked_by_legacy_checkpoints(store: &dyn Store) {
    seed_legacy(store).await;
    store
        .execute(
            "INSERT INTO tidemark_checkpoints (filename, idx, checksum) VALUES ('3_c.sql', 0, 'abc')",
        )
        .await
        .unwrap();
    assert_eq!(store.ensure_version_table().await.unwrap(), 0);

    let err = store
        .upgrade_schema(0, &legacy_history())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UpgradeBlocked { count: 1 }));

    // Nothing changed
    assert_eq!(store.ensure_version_table().await.unwrap(), 0);
    assert!(store
        .execute("INSERT INTO tidemark_migrations (filename, checksum) VALUES ('9.sql', 'zzz')")
        .await
        .is_ok());
}

/// Version table with a column the upgrade does not fill, so the final
/// version insert fails after the history tables were rebuilt.
pub(crate) const STRICT_VERSION_TABLE_SQL: &str =
    "CREATE TABLE tidemark_schema_version (version BIGINT NOT NULL, extra INTEGER NOT NULL)";

pub(crate) async fn failed_upgrade_rolls_back(store: &dyn Store) {
    seed_legacy(store).await;
    store.execute(STRICT_VERSION_TABLE_SQL).await.unwrap();
    assert_eq!(store.ensure_version_table().await.unwrap(), 0);

    assert!(store.upgrade_schema(0, &legacy_history()).await.is_err());

    assert_eq!(store.ensure_version_table().await.unwrap(), 0);
    // Legacy layout: no content column, checksums still unique
    assert!(store
        .execute("UPDATE tidemark_migrations SET content = '' WHERE 1 = 0")
        .await
        .is_err());
    let duplicate = format!(
        "INSERT INTO tidemark_migrations (filename, checksum) VALUES ('9.sql', '{}')",
        legacy_history()[0].checksum
    );
    assert!(store.execute(&duplicate).await.is_err());
    assert!(store
        .execute("DELETE FROM tidemark_migrations_v0 WHERE 1 = 0")
        .await
        .is_err());
}

pub(crate) async fn upgrade_from_unknown_version(store: &dyn Store) {
    prepare(store).await;
    let err = store.upgrade_schema(7, &[]).await.unwrap_err();
    assert!(matches!(err, DbError::UnsupportedUpgrade { from: 7 }));
}
