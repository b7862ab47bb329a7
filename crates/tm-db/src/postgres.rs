//! PostgreSQL store backend implementation

use crate::error::{DbError, DbResult};
use crate::schema::{
    CHECKPOINTS_TABLE, CURRENT_SCHEMA_VERSION, LEGACY_MIGRATIONS_TABLE, MIGRATIONS_TABLE,
    VERSION_TABLE,
};
use crate::traits::{CheckpointScope, SchemaVersion, Store};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls};
use tm_core::{Checkpoint, Migration};

fn create_migrations_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
            filename   TEXT NOT NULL UNIQUE,
            checksum   TEXT NOT NULL,
            content    TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT now()
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
            created_at TIMESTAMP NOT NULL DEFAULT now(),
            PRIMARY KEY (filename, idx)
        )"
    )
}

/// PostgreSQL store backend
pub struct PostgresBackend {
    client: Mutex<Client>,
}

impl PostgresBackend {
    /// Connect to a server; the connection task runs on the ambient runtime
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        dbname: &str,
    ) -> DbResult<Self> {
        let mut config = tokio_postgres::Config::new();
        config.host(host).port(port).user(user).dbname(dbname);
        if !password.is_empty() {
            config.password(password);
        }

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| DbError::ConnectionError(format!("{host}:{port}/{dbname}: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("PostgreSQL connection error: {e}");
            }
        });

        Ok(Self {
            client: Mutex::new(client),
        })
    }

    async fn table_exists(client: &Client, name: &str) -> DbResult<bool> {
        let row = client
            .query_one(
                "SELECT EXISTS (
                     SELECT 1 FROM information_schema.tables
                     WHERE table_schema = current_schema() AND table_name = $1
                 )",
                &[&name],
            )
            .await?;
        Ok(row.try_get(0)?)
    }
}

fn checkpoint_index(checkpoint: &Checkpoint) -> DbResult<i32> {
    i32::try_from(checkpoint.idx)
        .map_err(|_| DbError::InvalidData(format!("checkpoint index {}", checkpoint.idx)))
}

#[async_trait]
impl Store for PostgresBackend {
    fn db_type(&self) -> &'static str {
        "postgres"
    }

    async fn ensure_version_table(&self) -> DbResult<SchemaVersion> {
        let client = self.client.lock().await;
        let fresh = !Self::table_exists(&*client, MIGRATIONS_TABLE).await?;
        client
            .batch_execute(&format!(
                "CREATE TABLE IF NOT EXISTS {VERSION_TABLE} (version BIGINT NOT NULL)"
            ))
            .await?;

        let row = client
            .query_one(&format!("SELECT MAX(version) FROM {VERSION_TABLE}"), &[])
            .await?;
        let version: Option<i64> = row.try_get(0)?;
        match version {
            Some(v) => SchemaVersion::try_from(v)
                .map_err(|_| DbError::InvalidData(format!("schema version {v}"))),
            None if fresh => {
                client
                    .execute(
                        &format!("INSERT INTO {VERSION_TABLE} (version) VALUES ($1)"),
                        &[&i64::from(CURRENT_SCHEMA_VERSION)],
                    )
                    .await?;
                Ok(CURRENT_SCHEMA_VERSION)
            }
            None => Ok(0),
        }
    }

    async fn ensure_migration_table(&self) -> DbResult<()> {
        let client = self.client.lock().await;
        client.batch_execute(&create_migrations_sql()).await?;
        Ok(())
    }

    async fn ensure_checkpoint_table(&self) -> DbResult<()> {
        let client = self.client.lock().await;
        client.batch_execute(&create_checkpoints_sql()).await?;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        let client = self.client.lock().await;
        client.batch_execute(sql).await?;
        Ok(())
    }

    async fn list_migrations(&self) -> DbResult<Vec<Migration>> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                &format!(
                    "SELECT filename, content, checksum FROM {MIGRATIONS_TABLE}
                     ORDER BY CAST(substring(filename FROM '^[0-9]+') AS NUMERIC), filename"
                ),
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| -> DbResult<Migration> {
                Ok(Migration {
                    filename: row.try_get(0)?,
                    content: row.try_get(1)?,
                    checksum: row.try_get(2)?,
                })
            })
            .collect()
    }

    async fn insert_migration(&self, migration: &Migration) -> DbResult<()> {
        let client = self.client.lock().await;
        client
            .execute(
                &format!(
                    "INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES ($1, $2, $3)"
                ),
                &[&migration.filename, &migration.content, &migration.checksum],
            )
            .await?;
        Ok(())
    }

    async fn upsert_migration(&self, migration: &Migration) -> DbResult<()> {
        let client = self.client.lock().await;
        client
            .execute(
                &format!(
                    "INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES ($1, $2, $3)
                     ON CONFLICT (filename) DO UPDATE
                     SET content = EXCLUDED.content, checksum = EXCLUDED.checksum"
                ),
                &[&migration.filename, &migration.content, &migration.checksum],
            )
            .await?;
        Ok(())
    }

    async fn list_checkpoints(&self, filename: &str) -> DbResult<Vec<String>> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                &format!(
                    "SELECT checksum FROM {CHECKPOINTS_TABLE} WHERE filename = $1 ORDER BY idx"
                ),
                &[&filename],
            )
            .await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(DbError::from))
            .collect()
    }

    async fn insert_checkpoint(&self, checkpoint: &Checkpoint) -> DbResult<()> {
        let idx = checkpoint_index(checkpoint)?;
        let client = self.client.lock().await;
        client
            .execute(
                &format!(
                    "INSERT INTO {CHECKPOINTS_TABLE} (filename, idx, content, checksum)
                     VALUES ($1, $2, $3, $4)"
                ),
                &[
                    &checkpoint.filename,
                    &idx,
                    &checkpoint.content,
                    &checkpoint.checksum,
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete_checkpoints(&self, scope: CheckpointScope<'_>) -> DbResult<()> {
        let client = self.client.lock().await;
        match scope {
            CheckpointScope::File(filename) => {
                client
                    .execute(
                        &format!("DELETE FROM {CHECKPOINTS_TABLE} WHERE filename = $1"),
                        &[&filename],
                    )
                    .await?
            }
            CheckpointScope::All => {
                client
                    .execute(&format!("DELETE FROM {CHECKPOINTS_TABLE}"), &[])
                    .await?
            }
        };
        Ok(())
    }

    async fn complete_migration(&self, migration: &Migration) -> DbResult<()> {
        let mut client = self.client.lock().await;
        let tx = client.transaction().await?;
        tx.execute(
            &format!("DELETE FROM {CHECKPOINTS_TABLE} WHERE filename = $1"),
            &[&migration.filename],
        )
        .await?;
        tx.execute(
            &format!(
                "INSERT INTO {MIGRATIONS_TABLE} (filename, content, checksum) VALUES ($1, $2, $3)"
            ),
            &[&migration.filename, &migration.content, &migration.checksum],
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn upgrade_from_v0(&self, migrations: &[Migration]) -> DbResult<()> {
        let mut client = self.client.lock().await;
        let tx = client.transaction().await?;

        let row = tx
            .query_one(&format!("SELECT COUNT(*) FROM {CHECKPOINTS_TABLE}"), &[])
            .await?;
        let count: i64 = row.try_get(0)?;
        if count > 0 {
            return Err(DbError::UpgradeBlocked { count });
        }

        tx.batch_execute(&format!(
            "CREATE TABLE {LEGACY_MIGRATIONS_TABLE} AS
                 SELECT filename, checksum, created_at FROM {MIGRATIONS_TABLE};
             DROP TABLE {MIGRATIONS_TABLE};
             {};",
            create_migrations_sql()
        ))
        .await?;
        for migration in migrations {
            tx.execute(
                &format!(
                    "INSERT INTO {MIGRATIONS_TABLE} (filename, checksum, content, created_at)
                     SELECT filename, checksum, $1::TEXT, created_at FROM {LEGACY_MIGRATIONS_TABLE}
                     WHERE filename = $2"
                ),
                &[&migration.content, &migration.filename],
            )
            .await?;
        }
        tx.batch_execute(&format!(
            "INSERT INTO {MIGRATIONS_TABLE} (filename, checksum, content, created_at)
                 SELECT filename, checksum, '', created_at FROM {LEGACY_MIGRATIONS_TABLE}
                 WHERE filename NOT IN (SELECT filename FROM {MIGRATIONS_TABLE});
             DROP TABLE {LEGACY_MIGRATIONS_TABLE};
             DROP TABLE {CHECKPOINTS_TABLE};
             {};
             DELETE FROM {VERSION_TABLE};
             INSERT INTO {VERSION_TABLE} (version) VALUES ({CURRENT_SCHEMA_VERSION});",
            create_checkpoints_sql()
        ))
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
