use super::*;
use clap::Parser;
use tm_core::DbType;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tidemark").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_flags_only() {
    let settings = merge(&cli(&["-n", "app.duckdb", "--dir", "sql"]), Config::default()).unwrap();
    assert_eq!(settings.migrations_dir, PathBuf::from("sql"));
    assert_eq!(
        settings.connection,
        ConnectionSettings::Embedded {
            db_type: DbType::DuckDb,
            path: "app.duckdb".to_string(),
        }
    );
}

#[test]
fn test_config_supplies_defaults() {
    let config = Config::parse(
        "migrations_dir: db/migrations\ndatabase:\n  type: postgres\n  name: app\n  user: deployer\n",
    )
    .unwrap();
    let settings = merge(&cli(&[]), config).unwrap();
    assert_eq!(settings.migrations_dir, PathBuf::from("db/migrations"));
    match settings.connection {
        ConnectionSettings::Network {
            db_type,
            port,
            user,
            name,
            ..
        } => {
            assert_eq!(db_type, DbType::Postgres);
            assert_eq!(port, 5432);
            assert_eq!(user, "deployer");
            assert_eq!(name, "app");
        }
        other => panic!("unexpected settings: {other:?}"),
    }
}

#[test]
fn test_flags_override_config() {
    let config = Config::parse("database:\n  type: mysql\n  name: app\n  port: 3307\n").unwrap();
    let settings = merge(&cli(&["-n", "other", "-p", "3308", "-u", "admin"]), config).unwrap();
    match settings.connection {
        ConnectionSettings::Network {
            port, user, name, ..
        } => {
            assert_eq!(port, 3308);
            assert_eq!(user, "admin");
            assert_eq!(name, "other");
        }
        other => panic!("unexpected settings: {other:?}"),
    }
}

#[test]
fn test_missing_name() {
    let err = merge(&cli(&["-t", "sqlite"]), Config::default()).unwrap_err();
    assert!(format!("{err:#}").contains("database name cannot be empty"));
}

#[test]
fn test_embedded_rejects_user_flag() {
    let err = merge(&cli(&["-t", "sqlite", "-n", "app.db", "-u", "root"]), Config::default())
        .unwrap_err();
    assert!(format!("{err:#}").contains("sqlite does not support the 'user' setting"));
}

#[test]
fn test_resolve_reads_explicit_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.yml");
    std::fs::write(&path, "database:\n  type: sqlite\n  name: app.db\n").unwrap();

    let settings = resolve(&cli(&["-c", path.to_str().unwrap()])).unwrap();
    assert_eq!(settings.connection.db_type(), DbType::Sqlite);
    assert_eq!(settings.migrations_dir, PathBuf::from("migrations"));
}

#[test]
fn test_resolve_missing_explicit_config() {
    let err = resolve(&cli(&["-c", "/nonexistent/tidemark.yml"])).unwrap_err();
    assert!(format!("{err:#}").contains("Config file not found"));
}
