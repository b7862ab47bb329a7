//! Shared helpers for engine tests

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tm_core::{FileSet, Migration};
use tm_db::Store;

/// Create a temporary migrations directory holding `files`
pub(crate) fn migrations_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        write_file(dir.path(), name, content);
    }
    dir
}

/// Write (or overwrite) a single migration file
pub(crate) fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Records as they would have been written after applying each file
pub(crate) fn applied(files: &FileSet) -> Vec<Migration> {
    files.iter().map(|f| f.load().unwrap()).collect()
}

/// Metadata layout written before the schema was versioned
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

/// Recreate a pre-versioning database that has applied `history`
pub(crate) async fn seed_legacy(store: &dyn Store, history: &[Migration]) {
    store.execute(LEGACY_LAYOUT_SQL).await.unwrap();
    for migration in history {
        store
            .execute(&format!(
                "INSERT INTO tidemark_migrations (filename, checksum) VALUES ('{}', '{}')",
                migration.filename, migration.checksum
            ))
            .await
            .unwrap();
    }
}
