//! tm-db - Storage layer for Tidemark
//!
//! This crate provides the `Store` trait the migration engine talks to and
//! one implementation per supported engine. DuckDB and SQLite are always
//! built; PostgreSQL and MySQL sit behind cargo features.

pub mod connect;
pub mod duckdb;
pub mod error;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod schema;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_utils;

pub use connect::connect;
pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
#[cfg(feature = "mysql")]
pub use mysql::MySqlBackend;
#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
pub use schema::{CHECKPOINTS_TABLE, CURRENT_SCHEMA_VERSION, MIGRATIONS_TABLE, VERSION_TABLE};
pub use sqlite::SqliteBackend;
pub use traits::{CheckpointScope, SchemaVersion, Store};
