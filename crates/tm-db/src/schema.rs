//! Metadata table names and layout versions shared by every backend

use crate::traits::SchemaVersion;

/// Layout version this build reads and writes
pub const CURRENT_SCHEMA_VERSION: SchemaVersion = 1;

/// Completed migrations
pub const MIGRATIONS_TABLE: &str = "tidemark_migrations";

/// Executed statements of unfinished migrations
pub const CHECKPOINTS_TABLE: &str = "tidemark_checkpoints";

/// Single-row layout version
pub const VERSION_TABLE: &str = "tidemark_schema_version";

/// Holds version 0 history rows while the migrations table is rebuilt
pub(crate) const LEGACY_MIGRATIONS_TABLE: &str = "tidemark_migrations_v0";
