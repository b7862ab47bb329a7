//! Store trait definition

use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use tm_core::{Checkpoint, Migration};

/// Version number describing the layout of the metadata tables themselves
pub type SchemaVersion = u32;

/// Which checkpoints to clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointScope<'a> {
    /// Checkpoints belonging to one migration file
    File(&'a str),
    /// Every checkpoint row
    All,
}

/// Storage contract the migration engine requires from a backend
///
/// Each backend owns its own DDL dialect, placeholder syntax, and upsert
/// form; the engine never branches on which backend it is talking to.
/// Implementations must be Send + Sync for async operation. Every method is
/// independently atomic unless documented otherwise.
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend identifier for logging
    fn db_type(&self) -> &'static str;

    /// Create the schema version table if needed and report the version.
    ///
    /// Must be called before the other `ensure_*` methods. A database with
    /// no migrations table yet is brand new: the current version is recorded
    /// and returned. A migrations table without a version row is the legacy
    /// layout and reports version 0.
    async fn ensure_version_table(&self) -> DbResult<SchemaVersion>;

    /// Create the migrations table if needed
    async fn ensure_migration_table(&self) -> DbResult<()>;

    /// Create the checkpoints table if needed
    async fn ensure_checkpoint_table(&self) -> DbResult<()>;

    /// Execute one migration statement against the live connection
    async fn execute(&self, sql: &str) -> DbResult<()>;

    /// All applied migrations, ordered by the numeric filename prefix
    async fn list_migrations(&self) -> DbResult<Vec<Migration>>;

    /// Record a completed migration; fails if the filename is already present
    async fn insert_migration(&self, migration: &Migration) -> DbResult<()>;

    /// Record or overwrite a migration (adoption only)
    async fn upsert_migration(&self, migration: &Migration) -> DbResult<()>;

    /// Checkpoint checksums for `filename`, ordered by index
    async fn list_checkpoints(&self, filename: &str) -> DbResult<Vec<String>>;

    /// Record one executed statement
    async fn insert_checkpoint(&self, checkpoint: &Checkpoint) -> DbResult<()>;

    /// Clear checkpoints for one file or for every file
    async fn delete_checkpoints(&self, scope: CheckpointScope<'_>) -> DbResult<()>;

    /// Delete the file's checkpoints and insert its migration record in a
    /// single transaction
    async fn complete_migration(&self, migration: &Migration) -> DbResult<()>;

    /// Move the version 0 layout to version 1 in a single transaction.
    ///
    /// `migrations` carries the content of every migration file on disk;
    /// version 0 did not persist content, so history rows are filled from it.
    async fn upgrade_from_v0(&self, migrations: &[Migration]) -> DbResult<()>;

    /// Run the one-time upgrade step that starts at `from`
    async fn upgrade_schema(&self, from: SchemaVersion, migrations: &[Migration]) -> DbResult<()> {
        match from {
            0 => self.upgrade_from_v0(migrations).await,
            other => Err(DbError::UnsupportedUpgrade { from: other }),
        }
    }
}
