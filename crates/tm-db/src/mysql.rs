//! MySQL store backend implementation
//!
//! MySQL commits DDL implicitly, so a failed schema upgrade can leave the
//! metadata tables partially rebuilt. Data statements inside the upgrade
//! still share one transaction.

use crate::error::{DbError, DbResult};
use crate::schema::{
    CHECKPOINTS_TABLE, CURRENT_SCHEMA_VERSION, LEGACY_MIGRATIONS_TABLE, MIGRATIONS_TABLE,
    VERSION_TABLE,
};
use crate::traits::{CheckpointScope, SchemaVersion, Store};
use async_trait::async_trait;
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, TxOpts};
use std::sync::Mutex;
use tm_core::{Checkpoint, Migration};

fn create_migrations_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
            filename   VARCHAR(255) NOT NULL UNIQUE,
            checksum   VARCHAR(64) NOT NULL,
            content    LONGTEXT NOT NULL,
            created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
        )"
    )
}

fn create_checkpoints_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {CHECKPOINTS_TABLE} (
            filename   VARCHAR(255) NOT NULL,
            idx        INTEGER NOT NULL,
            checksum   VARCHAR(64) NOT NULL,
            content    LONGTEXT NOT NULL,
            created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
            PRIMARY KEY (filename, idx)
        )"
    )
}

/// MySQL store backend
pub struct MySqlBackend {
    conn: Mutex<Conn>,
}

impl MySqlBackend {
    /// Open a connection to a MySQL or MariaDB server
    pub fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        dbname: &str,
    ) -> DbResult<Self> {
        let mut opts = OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .tcp_port(port)
            .user(Some(user))
            .db_name(Some(dbname));
        if !password.is_empty() {
            opts = opts.pass(Some(password));
        }

        let conn = Conn::new(opts)
            .map_err(|e| DbError::ConnectionError(format!("{host}:{port}/{dbname}: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn table_exists(conn: &mut Conn, name: &str) -> DbResult<bool> {
        let count: Option<i64> = conn.exec_first(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = DATABASE() AND table_name = ?",
            (name,),
        )?;
        Ok(count.unwrap_or(0) > 0)
    }
}

fn checkpoint_index(checkpoint: &Checkpoint) -> DbResult<i32> {
    i32::try_from(checkpoint.idx)
        .map_err(|_| DbError::InvalidData(format!("checkpoint index {}", checkpoint.idx)))
}

#[async_trait]
impl Store for MySqlBackend {
    fn db_type(&self) -> &'static str {
        "mysql"
    }

    async fn ensure_version_table(&self) -> DbResult<SchemaVersion> {
        let mut conn = self.conn.lock()?;
        let fresh = !Self::table_exists(&mut conn, MIGRATIONS_TABLE)?;
        conn.query_drop(format!(
            "CREATE TABLE IF NOT EXISTS {VERSION_TABLE} (version BIGINT NOT NULL)"
        ))?;

        // MAX() yields one NULL row on an empty table
        let version: Option<(Option<i64>,)> =
            conn.query_first(format!("SELECT MAX(version) FROM {VERSION_TABLE}"))?;
        match version.and_then(|(v,)| v) {
            Some(v) => SchemaVersion::try_from(v)
                .map_err(|_| DbError::InvalidData(format!("schema version {v}"))),
            None if fresh => {
                conn.exec_drop(
                    format!("INSERT INTO {VERSION_TABLE} (version) VALUES (?)"),
                    (i64::from(CURRENT_SCHEMA_VERSION),),
                )?;
                Ok(CURRENT_SCHEMA_VERSION)
            }
            None => Ok(0),
        }
    }

    async fn ensure_migration_table(&self) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        conn.query_drop(create_migrations_sql())?;
        Ok(())
    }

    async fn ensure_checkpoint_table(&self) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        conn.query_drop(create_checkpoints_sql())?;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        conn.query_drop(sql)?;
        Ok(())
    }

    async fn list_migrations(&self) -> DbResult<Vec<Migration>> {
        let mut conn = self.conn.lock()?;
        let migrations = conn.query_map(
            format!(
                "SELECT filename, content, checksum FROM {MIGRATIONS_TABLE}
                 ORDER BY CAST(filename AS UNSIGNED), filename"
            ),
            |(filename, content, checksum): (String, String, String)| Migration {
                filename,
                content,
                checksum,
            },
        )?;
        Ok(migrations)
    }

    async fn insert_migration(&self, migration: &Migration) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        conn.exec_drop(
            format!("INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES (?, ?, ?)"),
            (&migration.filename, &migration.content, &migration.checksum),
        )?;
        Ok(())
    }

    async fn upsert_migration(&self, migration: &Migration) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        conn.exec_drop(
            format!(
                "INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES (?, ?, ?)
                 ON DUPLICATE KEY UPDATE content = VALUES(content), checksum = VALUES(checksum)"
            ),
            (&migration.filename, &migration.content, &migration.checksum),
        )?;
        Ok(())
    }

    async fn list_checkpoints(&self, filename: &str) -> DbResult<Vec<String>> {
        let mut conn = self.conn.lock()?;
        let checksums = conn.exec_map(
            format!("SELECT checksum FROM {CHECKPOINTS_TABLE} WHERE filename = ? ORDER BY idx"),
            (filename,),
            |checksum: String| checksum,
        )?;
        Ok(checksums)
    }

    async fn insert_checkpoint(&self, checkpoint: &Checkpoint) -> DbResult<()> {
        let idx = checkpoint_index(checkpoint)?;
        let mut conn = self.conn.lock()?;
        conn.exec_drop(
            format!(
                "INSERT INTO {CHECKPOINTS_TABLE} (filename, idx, content, checksum)
                 VALUES (?, ?, ?, ?)"
            ),
            (
                &checkpoint.filename,
                idx,
                &checkpoint.content,
                &checkpoint.checksum,
            ),
        )?;
        Ok(())
    }

    async fn delete_checkpoints(&self, scope: CheckpointScope<'_>) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        match scope {
            CheckpointScope::File(filename) => conn.exec_drop(
                format!("DELETE FROM {CHECKPOINTS_TABLE} WHERE filename = ?"),
                (filename,),
            )?,
            CheckpointScope::All => conn.query_drop(format!("DELETE FROM {CHECKPOINTS_TABLE}"))?,
        }
        Ok(())
    }

    async fn complete_migration(&self, migration: &Migration) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        let mut tx = conn.start_transaction(TxOpts::default())?;
        tx.exec_drop(
            format!("DELETE FROM {CHECKPOINTS_TABLE} WHERE filename = ?"),
            (&migration.filename,),
        )?;
        tx.exec_drop(
            format!("INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES (?, ?, ?)"),
            (&migration.filename, &migration.content, &migration.checksum),
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn upgrade_from_v0(&self, migrations: &[Migration]) -> DbResult<()> {
        let mut conn = self.conn.lock()?;
        let mut tx = conn.start_transaction(TxOpts::default())?;

        let count: Option<i64> =
            tx.query_first(format!("SELECT COUNT(*) FROM {CHECKPOINTS_TABLE}"))?;
        let count = count.unwrap_or(0);
        if count > 0 {
            return Err(DbError::UpgradeBlocked { count });
        }

        tx.query_drop(format!(
            "CREATE TABLE {LEGACY_MIGRATIONS_TABLE} AS
             SELECT filename, checksum, created_at FROM {MIGRATIONS_TABLE}"
        ))?;
        tx.query_drop(format!("DROP TABLE {MIGRATIONS_TABLE}"))?;
        tx.query_drop(create_migrations_sql())?;
        for migration in migrations {
            tx.exec_drop(
                format!(
                    "INSERT INTO {MIGRATIONS_TABLE} (filename, checksum, content, created_at)
                     SELECT filename, checksum, ?, created_at FROM {LEGACY_MIGRATIONS_TABLE}
                     WHERE filename = ?"
                ),
                (&migration.content, &migration.filename),
            )?;
        }
        // MySQL cannot read the insert target in a subquery of the same statement
        tx.query_drop(format!(
            "INSERT INTO {MIGRATIONS_TABLE} (filename, checksum, content, created_at)
             SELECT l.filename, l.checksum, '', l.created_at FROM {LEGACY_MIGRATIONS_TABLE} l
             LEFT JOIN {MIGRATIONS_TABLE} m ON m.filename = l.filename
             WHERE m.filename IS NULL"
        ))?;
        tx.query_drop(format!("DROP TABLE {LEGACY_MIGRATIONS_TABLE}"))?;
        tx.query_drop(format!("DROP TABLE {CHECKPOINTS_TABLE}"))?;
        tx.query_drop(create_checkpoints_sql())?;
        tx.query_drop(format!("DELETE FROM {VERSION_TABLE}"))?;
        tx.exec_drop(
            format!("INSERT INTO {VERSION_TABLE} (version) VALUES (?)"),
            (i64::from(CURRENT_SCHEMA_VERSION),),
        )?;

        tx.commit()?;
        Ok(())
    }
}
