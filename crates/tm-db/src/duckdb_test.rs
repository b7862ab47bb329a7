use super::*;
use crate::test_utils as contract;

fn db() -> DuckDbBackend {
    DuckDbBackend::in_memory().unwrap()
}

#[tokio::test]
async fn test_in_memory() {
    let db = db();
    assert_eq!(db.db_type(), "duckdb");
}

#[tokio::test]
async fn test_new_memory_path() {
    let db = DuckDbBackend::new(":memory:").unwrap();
    assert_eq!(db.query_scalar("SELECT 42").unwrap(), 42);
}

#[tokio::test]
async fn test_from_path_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.duckdb");
    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        contract::prepare(&db).await;
        db.insert_migration(&Migration::new("1.sql", "SELECT 1"))
            .await
            .unwrap();
    }

    let db = DuckDbBackend::from_path(&path).unwrap();
    assert_eq!(
        db.ensure_version_table().await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
    assert_eq!(db.list_migrations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fresh_database_starts_current() {
    let db = db();
    contract::fresh_database_starts_current(&db).await;
    let rows = db
        .query_scalar(&format!("SELECT COUNT(*) FROM {VERSION_TABLE}"))
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_migrations_list_in_numeric_order() {
    contract::migrations_list_in_numeric_order(&db()).await;
}

#[tokio::test]
async fn test_insert_rejects_duplicate() {
    contract::insert_rejects_duplicate(&db()).await;
}

#[tokio::test]
async fn test_identical_content_is_allowed() {
    contract::identical_content_is_allowed(&db()).await;
}

#[tokio::test]
async fn test_upsert_overwrites() {
    contract::upsert_overwrites(&db()).await;
}

#[tokio::test]
async fn test_checkpoints_round_trip() {
    contract::checkpoints_round_trip(&db()).await;
}

#[tokio::test]
async fn test_duplicate_checkpoint_rejected() {
    contract::duplicate_checkpoint_rejected(&db()).await;
}

#[tokio::test]
async fn test_complete_migration_is_one_unit() {
    contract::complete_migration_is_one_unit(&db()).await;
}

#[tokio::test]
async fn test_execute_reports_errors() {
    let db = db();
    contract::execute_reports_errors(&db).await;
    assert_eq!(db.query_scalar("SELECT COUNT(*) FROM widgets").unwrap(), 1);
}

#[tokio::test]
async fn test_legacy_layout_reports_version_zero() {
    contract::legacy_layout_reports_version_zero(&db()).await;
}

#[tokio::test]
async fn test_upgrade_from_v0_fills_content() {
    let db = db();
    contract::upgrade_from_v0_fills_content(&db).await;
    let leftovers = db
        .query_scalar(&format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = '{LEGACY_MIGRATIONS_TABLE}'"
        ))
        .unwrap();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_upgrade_keeps_rows_without_files() {
    contract::upgrade_keeps_rows_without_files(&db()).await;
}

#[tokio::test]
async fn test_upgrade_preserves_created_at() {
    let db = db();
    db.execute(contract::LEGACY_LAYOUT_SQL).await.unwrap();
    db.execute(&format!(
        "INSERT INTO {MIGRATIONS_TABLE} (filename, checksum, created_at)
         VALUES ('1.sql', 'abc', TIMESTAMP '2020-01-02 03:04:05')"
    ))
    .await
    .unwrap();
    assert_eq!(db.ensure_version_table().await.unwrap(), 0);

    db.upgrade_schema(0, &[Migration::new("1.sql", "SELECT 1")])
        .await
        .unwrap();

    let year = db
        .query_scalar(&format!(
            "SELECT CAST(year(created_at) AS BIGINT) FROM {MIGRATIONS_TABLE}"
        ))
        .unwrap();
    assert_eq!(year, 2020);
}

#[tokio::test]
async fn test_upgrade_blocked_by_legacy_checkpoints() {
    contract::upgrade_blocked_by_legacy_checkpoints(&db()).await;
}

#[tokio::test]
async fn test_failed_upgrade_rolls_back() {
    contract::failed_upgrade_rolls_back(&db()).await;
}

#[tokio::test]
async fn test_upgrade_from_unknown_version() {
    contract::upgrade_from_unknown_version(&db()).await;
}
