//! SQLite store backend implementation

use crate::error::{DbError, DbResult};
use crate::schema::{
    CHECKPOINTS_TABLE, CURRENT_SCHEMA_VERSION, LEGACY_MIGRATIONS_TABLE, MIGRATIONS_TABLE,
    VERSION_TABLE,
};
use crate::traits::{CheckpointScope, SchemaVersion, Store};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tm_core::{Checkpoint, Migration};

fn create_migrations_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
            filename   TEXT NOT NULL UNIQUE,
            checksum   TEXT NOT NULL,
            content    TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"
    )
}

fn create_checkpoints_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {CHECKPOINTS_TABLE} (
            filename   TEXT NOT NULL,
            idx        INTEGER NOT NULL,
            checksum   TEXT NOT NULL,
            content    TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (filename, idx)
        )"
    )
}

/// SQLite store backend
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open a throwaway in-memory database
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open (or create) a database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Run a query returning a single integer
    pub fn query_scalar(&self, sql: &str) -> DbResult<i64> {
        let conn = self.conn.lock()?;
        let value: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(value)
    }

    fn table_exists(conn: &Connection, name: &str) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[async_trait]
impl Store for SqliteBackend {
    fn db_type(&self) -> &'static str {
        "sqlite"
    }

    async fn ensure_version_table(&self) -> DbResult<SchemaVersion> {
        let conn = self.conn.lock()?;
        let fresh = !Self::table_exists(&conn, MIGRATIONS_TABLE)?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {VERSION_TABLE} (version INTEGER NOT NULL)"
        ))?;

        let version: Option<i64> =
            conn.query_row(&format!("SELECT MAX(version) FROM {VERSION_TABLE}"), [], |row| {
                row.get(0)
            })?;
        match version {
            Some(v) => SchemaVersion::try_from(v)
                .map_err(|_| DbError::InvalidData(format!("schema version {v}"))),
            None if fresh => {
                conn.execute(
                    &format!("INSERT INTO {VERSION_TABLE} (version) VALUES (?1)"),
                    params![i64::from(CURRENT_SCHEMA_VERSION)],
                )?;
                Ok(CURRENT_SCHEMA_VERSION)
            }
            None => Ok(0),
        }
    }

    async fn ensure_migration_table(&self) -> DbResult<()> {
        let conn = self.conn.lock()?;
        conn.execute_batch(&create_migrations_sql())?;
        Ok(())
    }

    async fn ensure_checkpoint_table(&self) -> DbResult<()> {
        let conn = self.conn.lock()?;
        conn.execute_batch(&create_checkpoints_sql())?;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    async fn list_migrations(&self) -> DbResult<Vec<Migration>> {
        let conn = self.conn.lock()?;
        // CAST to INTEGER keeps only the leading digits of the filename
        let mut stmt = conn.prepare(&format!(
            "SELECT filename, content, checksum FROM {MIGRATIONS_TABLE}
             ORDER BY CAST(filename AS INTEGER), filename"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(Migration {
                filename: row.get(0)?,
                content: row.get(1)?,
                checksum: row.get(2)?,
            })
        })?;
        let migrations = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(migrations)
    }

    async fn insert_migration(&self, migration: &Migration) -> DbResult<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES (?1, ?2, ?3)"
            ),
            params![migration.filename, migration.content, migration.checksum],
        )?;
        Ok(())
    }

    async fn upsert_migration(&self, migration: &Migration) -> DbResult<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES (?1, ?2, ?3)
                 ON CONFLICT (filename) DO UPDATE
                 SET content = excluded.content, checksum = excluded.checksum"
            ),
            params![migration.filename, migration.content, migration.checksum],
        )?;
        Ok(())
    }

    async fn list_checkpoints(&self, filename: &str) -> DbResult<Vec<String>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT checksum FROM {CHECKPOINTS_TABLE} WHERE filename = ?1 ORDER BY idx"
        ))?;
        let rows = stmt.query_map(params![filename], |row| row.get::<_, String>(0))?;
        let checksums = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(checksums)
    }

    async fn insert_checkpoint(&self, checkpoint: &Checkpoint) -> DbResult<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {CHECKPOINTS_TABLE} (filename, idx, content, checksum)
                 VALUES (?1, ?2, ?3, ?4)"
            ),
            params![
                checkpoint.filename,
                checkpoint.idx as i64,
                checkpoint.content,
                checkpoint.checksum
            ],
        )?;
        Ok(())
    }

    async fn delete_checkpoints(&self, scope: CheckpointScope<'_>) -> DbResult<()> {
        let conn = self.conn.lock()?;
        match scope {
            CheckpointScope::File(filename) => conn.execute(
                &format!("DELETE FROM {CHECKPOINTS_TABLE} WHERE filename = ?1"),
                params![filename],
            )?,
            CheckpointScope::All => {
                conn.execute(&format!("DELETE FROM {CHECKPOINTS_TABLE}"), [])?
            }
        };
        Ok(())
    }

    async fn complete_migration(&self, migration: &Migration) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            &format!("DELETE FROM {CHECKPOINTS_TABLE} WHERE filename = ?1"),
            params![migration.filename],
        )?;
        tx.execute(
            &format!(
                "INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES (?1, ?2, ?3)"
            ),
            params![migration.filename, migration.content, migration.checksum],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn upgrade_from_v0(&self, migrations: &[Migration]) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;

        let count: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {CHECKPOINTS_TABLE}"),
            [],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Err(DbError::UpgradeBlocked { count });
        }

        // SQLite cannot drop a UNIQUE constraint in place
        tx.execute_batch(&format!(
            "CREATE TABLE {LEGACY_MIGRATIONS_TABLE} AS
                 SELECT filename, checksum, created_at FROM {MIGRATIONS_TABLE};
             DROP TABLE {MIGRATIONS_TABLE};
             {};",
            create_migrations_sql()
        ))?;
        for migration in migrations {
            tx.execute(
                &format!(
                    "INSERT INTO {MIGRATIONS_TABLE} (filename, checksum, content, created_at)
                     SELECT filename, checksum, ?1, created_at FROM {LEGACY_MIGRATIONS_TABLE}
                     WHERE filename = ?2"
                ),
                params![migration.content, migration.filename],
            )?;
        }
        tx.execute_batch(&format!(
            "INSERT INTO {MIGRATIONS_TABLE} (filename, checksum, content, created_at)
                 SELECT filename, checksum, '', created_at FROM {LEGACY_MIGRATIONS_TABLE}
                 WHERE filename NOT IN (SELECT filename FROM {MIGRATIONS_TABLE});
             DROP TABLE {LEGACY_MIGRATIONS_TABLE};
             DROP TABLE {CHECKPOINTS_TABLE};
             {};
             DELETE FROM {VERSION_TABLE};
             INSERT INTO {VERSION_TABLE} (version) VALUES ({CURRENT_SCHEMA_VERSION});",
            create_checkpoints_sql()
        ))?;

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
