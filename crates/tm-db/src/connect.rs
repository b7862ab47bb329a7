//! Backend selection from resolved connection settings

use crate::duckdb::DuckDbBackend;
use crate::error::DbResult;
use crate::sqlite::SqliteBackend;
use crate::traits::Store;
use tm_core::{ConnectionSettings, DbType};

/// Open a store for the given settings
pub async fn connect(settings: &ConnectionSettings) -> DbResult<Box<dyn Store>> {
    log::debug!("Connecting with {settings:?}");
    match settings {
        ConnectionSettings::Embedded { db_type, path } => match db_type {
            DbType::Sqlite => Ok(Box::new(SqliteBackend::new(path)?)),
            _ => Ok(Box::new(DuckDbBackend::new(path)?)),
        },
        ConnectionSettings::Network {
            db_type,
            host,
            port,
            user,
            password,
            name,
        } => match db_type {
            DbType::MySql => connect_mysql(host, *port, user, password, name),
            _ => connect_postgres(host, *port, user, password, name).await,
        },
    }
}

#[cfg(feature = "postgres")]
async fn connect_postgres(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    name: &str,
) -> DbResult<Box<dyn Store>> {
    let backend =
        crate::postgres::PostgresBackend::connect(host, port, user, password, name).await?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "postgres"))]
async fn connect_postgres(
    _host: &str,
    _port: u16,
    _user: &str,
    _password: &str,
    _name: &str,
) -> DbResult<Box<dyn Store>> {
    Err(crate::error::DbError::BackendUnavailable {
        backend: DbType::Postgres.to_string(),
    })
}

#[cfg(feature = "mysql")]
fn connect_mysql(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    name: &str,
) -> DbResult<Box<dyn Store>> {
    let backend = crate::mysql::MySqlBackend::connect(host, port, user, password, name)?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "mysql"))]
fn connect_mysql(
    _host: &str,
    _port: u16,
    _user: &str,
    _password: &str,
    _name: &str,
) -> DbResult<Box<dyn Store>> {
    Err(crate::error::DbError::BackendUnavailable {
        backend: DbType::MySql.to_string(),
    })
}

#[cfg(test)]
#[path = "connect_test.rs"]
mod tests;
