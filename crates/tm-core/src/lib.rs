//! tm-core - Core library for Tidemark
//!
//! This crate provides the pieces every other Tidemark component builds on:
//! content checksums, migration file discovery and ordering, statement
//! splitting, the persisted record types, and configuration parsing.

pub mod checksum;
pub mod config;
pub mod error;
pub mod migration_file;
pub mod record;
pub mod statement;

pub use checksum::compute_checksum;
pub use config::{Config, ConnectionSettings, DatabaseConfig, DbType};
pub use error::{CoreError, CoreResult};
pub use migration_file::{FileSet, MigrationFile};
pub use record::{Checkpoint, Migration};
pub use statement::split_statements;
