//! Merge the config file and command-line flags into run settings

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tm_core::{Config, ConnectionSettings};

use crate::cli::Cli;

/// Everything a run needs once config and flags are combined
#[derive(Debug)]
pub(crate) struct RunSettings {
    pub(crate) migrations_dir: PathBuf,
    pub(crate) connection: ConnectionSettings,
}

/// Load the config file (if any) and overlay the flags given on the command line.
pub(crate) fn resolve(cli: &Cli) -> Result<RunSettings> {
    let config = match &cli.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config file {path}"))?,
        None => Config::load_from_dir(Path::new("."))?,
    };
    merge(cli, config)
}

fn merge(cli: &Cli, mut config: Config) -> Result<RunSettings> {
    let database = &mut config.database;
    if let Some(db_type) = cli.db_type {
        database.db_type = db_type.into();
    }
    overlay(&mut database.name, &cli.db);
    overlay(&mut database.host, &cli.host);
    overlay(&mut database.user, &cli.user);
    overlay(&mut database.password, &cli.pass);
    if cli.port.is_some() {
        database.port = cli.port;
    }

    let connection = database
        .resolve()
        .with_context(|| format!("Invalid {} connection settings", database.db_type))?;
    let migrations_dir = PathBuf::from(cli.dir.as_deref().unwrap_or(&config.migrations_dir));

    Ok(RunSettings {
        migrations_dir,
        connection,
    })
}

fn overlay(target: &mut Option<String>, flag: &Option<String>) {
    if flag.is_some() {
        target.clone_from(flag);
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
