use super::*;
use crate::error::ErrorKind;
use crate::test_utils::{applied, migrations_dir, seed_legacy};
use tm_db::DuckDbBackend;

#[tokio::test]
async fn test_fresh_database_needs_no_upgrade() {
    let dir = migrations_dir(&[("1.sql", "SELECT 1;")]);
    let files = FileSet::discover(dir.path()).unwrap();
    let db = DuckDbBackend::in_memory().unwrap();

    let upgraded = SchemaUpgrader::new(&db).prepare(&files).await.unwrap();
    assert_eq!(upgraded, None);
    assert!(db.list_migrations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_legacy_database_is_upgraded() {
    let dir = migrations_dir(&[("1.sql", "SELECT 1;"), ("2.sql", "SELECT 2;")]);
    let files = FileSet::discover(dir.path()).unwrap();
    let history = applied(&files);
    let db = DuckDbBackend::in_memory().unwrap();
    seed_legacy(&db, &history[..1]).await;

    let upgraded = SchemaUpgrader::new(&db).prepare(&files).await.unwrap();
    assert_eq!(upgraded, Some(0));
    assert_eq!(db.list_migrations().await.unwrap(), history[..1].to_vec());

    // Second pass sees the current layout
    let again = SchemaUpgrader::new(&db).prepare(&files).await.unwrap();
    assert_eq!(again, None);
}

#[tokio::test]
async fn test_blocked_upgrade_is_schema_error() {
    let dir = migrations_dir(&[("1.sql", "SELECT 1;")]);
    let files = FileSet::discover(dir.path()).unwrap();
    let db = DuckDbBackend::in_memory().unwrap();
    seed_legacy(&db, &applied(&files)).await;
    db.execute("INSERT INTO tidemark_checkpoints (filename, idx, checksum) VALUES ('2.sql', 0, 'x')")
        .await
        .unwrap();

    let err = SchemaUpgrader::new(&db).prepare(&files).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(matches!(
        err,
        EngineError::SchemaUpgradeFailed { from: 0, to: 1, .. }
    ));
}

#[tokio::test]
async fn test_newer_schema_is_refused() {
    let dir = migrations_dir(&[("1.sql", "SELECT 1;")]);
    let files = FileSet::discover(dir.path()).unwrap();
    let db = DuckDbBackend::in_memory().unwrap();
    SchemaUpgrader::new(&db).prepare(&files).await.unwrap();
    db.execute("UPDATE tidemark_schema_version SET version = 9")
        .await
        .unwrap();

    let err = SchemaUpgrader::new(&db).prepare(&files).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::UnsupportedSchemaVersion {
            found: 9,
            supported: CURRENT_SCHEMA_VERSION
        }
    ));
}

#[tokio::test]
async fn test_failed_upgrade_leaves_legacy_layout() {
    let dir = migrations_dir(&[("1.sql", "SELECT 1;"), ("2.sql", "SELECT 2;")]);
    let files = FileSet::discover(dir.path()).unwrap();
    let db = tm_db::SqliteBackend::in_memory().unwrap();
    seed_legacy(&db, &applied(&files)).await;
    // The final version insert cannot satisfy the extra column
    db.execute("CREATE TABLE tidemark_schema_version (version BIGINT NOT NULL, extra INTEGER NOT NULL)")
        .await
        .unwrap();

    let err = SchemaUpgrader::new(&db).prepare(&files).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::SchemaUpgradeFailed { from: 0, to: 1, .. }
    ));

    assert_eq!(db.ensure_version_table().await.unwrap(), 0);
    assert!(db
        .execute("UPDATE tidemark_migrations SET content = '' WHERE 1 = 0")
        .await
        .is_err());
    assert!(db
        .execute("DELETE FROM tidemark_migrations_v0 WHERE 1 = 0")
        .await
        .is_err());
    assert_eq!(
        db.query_scalar("SELECT COUNT(*) FROM tidemark_migrations")
            .unwrap(),
        2
    );
}
