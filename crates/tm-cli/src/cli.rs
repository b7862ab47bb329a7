//! CLI argument definitions using clap derive API

use clap::{Parser, ValueEnum};
use tm_core::DbType;

/// Tidemark - forward-only SQL migrations with checkpointed resume
#[derive(Parser, Debug)]
#[command(name = "tidemark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Migrations directory [default: from config, else "migrations"]
    #[arg(long)]
    pub dir: Option<String>,

    /// Database name, or database file path for duckdb and sqlite
    #[arg(short = 'n', long = "db")]
    pub db: Option<String>,

    /// Database type [default: from config, else duckdb]
    #[arg(short = 't', long = "type", value_enum)]
    pub db_type: Option<DbTypeArg>,

    /// Database host (postgres, mysql)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Database port (postgres, mysql)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Database user (postgres, mysql)
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Database password (postgres, mysql)
    #[arg(long = "pass", env = "TIDEMARK_PASSWORD", hide_env_values = true)]
    pub pass: Option<String>,

    /// Mark migrations up to and including this file as applied without running them
    #[arg(long, value_name = "FILE", conflicts_with = "dry_run")]
    pub skip: Option<String>,

    /// Show which migrations would run without running them
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Config file path [default: ./tidemark.yml if present]
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Database types accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbTypeArg {
    /// DuckDB database file
    #[value(name = "duckdb")]
    DuckDb,
    /// SQLite database file
    Sqlite,
    /// PostgreSQL server
    Postgres,
    /// MySQL or MariaDB server
    #[value(name = "mysql")]
    MySql,
}

impl From<DbTypeArg> for DbType {
    fn from(arg: DbTypeArg) -> Self {
        match arg {
            DbTypeArg::DuckDb => DbType::DuckDb,
            DbTypeArg::Sqlite => DbType::Sqlite,
            DbTypeArg::Postgres => DbType::Postgres,
            DbTypeArg::MySql => DbType::MySql,
        }
    }
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
