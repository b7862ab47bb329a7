//! Configuration types and parsing for tidemark.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Config file looked up in the working directory when none is given
pub const CONFIG_FILE_NAME: &str = "tidemark.yml";

/// Default host for network backends
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Main configuration from tidemark.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing the migration files
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            database: DatabaseConfig::default(),
        }
    }
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::ConfigParseError {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    /// Load `tidemark.yml` from a directory, falling back to defaults when
    /// the file does not exist
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            log::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(Self::default())
        }
    }

    /// Parse configuration from YAML text; an empty document yields defaults
    pub fn parse(content: &str) -> CoreResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
            message: e.to_string(),
        })
    }
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// SQLite
    Sqlite,
    /// PostgreSQL
    Postgres,
    /// MySQL / MariaDB
    MySql,
}

impl DbType {
    /// Embedded engines are addressed by a file path, not a server
    pub fn is_embedded(self) -> bool {
        matches!(self, DbType::DuckDb | DbType::Sqlite)
    }

    /// Default server port for network backends
    pub fn default_port(self) -> Option<u16> {
        match self {
            DbType::Postgres => Some(5432),
            DbType::MySql => Some(3306),
            DbType::DuckDb | DbType::Sqlite => None,
        }
    }

    /// Default login user for network backends
    pub fn default_user(self) -> Option<&'static str> {
        match self {
            DbType::Postgres => Some("postgres"),
            DbType::MySql => Some("root"),
            DbType::DuckDb | DbType::Sqlite => None,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
            DbType::Sqlite => write!(f, "sqlite"),
            DbType::Postgres => write!(f, "postgres"),
            DbType::MySql => write!(f, "mysql"),
        }
    }
}

/// Database connection configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database name, or the database file path for embedded engines
    #[serde(default)]
    pub name: Option<String>,

    /// Server host (network backends only)
    #[serde(default)]
    pub host: Option<String>,

    /// Server port (network backends only)
    #[serde(default)]
    pub port: Option<u16>,

    /// Login user (network backends only)
    #[serde(default)]
    pub user: Option<String>,

    /// Login password (network backends only)
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("db_type", &self.db_type)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl DatabaseConfig {
    /// Validate the configuration for its backend and fill in defaults.
    pub fn resolve(&self) -> CoreResult<ConnectionSettings> {
        let name = match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => {
                return Err(CoreError::ConfigInvalid {
                    message: "database name cannot be empty".to_string(),
                })
            }
        };

        if self.db_type.is_embedded() {
            let unsupported = [
                ("user", self.user.is_some()),
                ("host", self.host.is_some()),
                ("port", self.port.is_some()),
                ("password", self.password.is_some()),
            ];
            if let Some((field, _)) = unsupported.iter().find(|(_, set)| *set) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{} does not support the '{}' setting", self.db_type, field),
                });
            }
            return Ok(ConnectionSettings::Embedded {
                db_type: self.db_type,
                path: name,
            });
        }

        let port = self.port.or(self.db_type.default_port()).unwrap_or_default();
        let user = self
            .user
            .clone()
            .or_else(|| self.db_type.default_user().map(String::from))
            .unwrap_or_default();

        Ok(ConnectionSettings::Network {
            db_type: self.db_type,
            host: self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            user,
            password: self.password.clone().unwrap_or_default(),
            name,
        })
    }
}

/// Fully validated connection settings for one backend
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectionSettings {
    /// File-backed engine (`:memory:` for a throwaway database)
    Embedded { db_type: DbType, path: String },
    /// Server-backed engine
    Network {
        db_type: DbType,
        host: String,
        port: u16,
        user: String,
        password: String,
        name: String,
    },
}

impl ConnectionSettings {
    /// Backend these settings target
    pub fn db_type(&self) -> DbType {
        match self {
            ConnectionSettings::Embedded { db_type, .. }
            | ConnectionSettings::Network { db_type, .. } => *db_type,
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionSettings::Embedded { db_type, path } => f
                .debug_struct("Embedded")
                .field("db_type", db_type)
                .field("path", path)
                .finish(),
            ConnectionSettings::Network {
                db_type,
                host,
                port,
                user,
                name,
                ..
            } => f
                .debug_struct("Network")
                .field("db_type", db_type)
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"***")
                .field("name", name)
                .finish(),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
