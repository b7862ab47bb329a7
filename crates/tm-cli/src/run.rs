//! Migrate command implementation

use anyhow::{Context, Result};
use tm_engine::{MigrationEngine, RunReport};

use crate::cli::Cli;
use crate::context;

/// Connect, run the engine, and print what happened
pub async fn execute(cli: &Cli) -> Result<()> {
    let settings = context::resolve(cli)?;
    let db_type = settings.connection.db_type();
    log::debug!(
        "Migrations directory {}, backend {db_type}",
        settings.migrations_dir.display()
    );
    let store = tm_db::connect(&settings.connection)
        .await
        .with_context(|| format!("Failed to open {db_type} database"))?;

    let mut engine =
        MigrationEngine::new(store.as_ref(), &settings.migrations_dir).dry_run(cli.dry_run);
    if let Some(target) = adoption_target(cli) {
        engine = engine.adopt_through(target);
    }

    let report = engine.run().await.with_context(|| {
        format!(
            "Migration run against {db_type} failed ({})",
            settings.migrations_dir.display()
        )
    })?;

    for line in report_lines(&report, cli.dry_run) {
        println!("{line}");
    }
    Ok(())
}

/// An empty `--skip` means no adoption
fn adoption_target(cli: &Cli) -> Option<&str> {
    cli.skip.as_deref().filter(|target| !target.is_empty())
}

/// User-facing summary of a run
fn report_lines(report: &RunReport, dry_run: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(from) = report.schema_upgraded_from {
        lines.push(format!("upgraded metadata schema from version {from}"));
    }
    lines.extend(report.adopted.iter().map(|name| format!("adopted {name}")));

    if dry_run {
        if report.pending.is_empty() {
            lines.push("up to date".to_string());
        }
        lines.extend(report.pending.iter().map(|name| format!("would migrate {name}")));
        return lines;
    }

    lines.extend(report.migrated.iter().map(|name| format!("migrated {name}")));
    if report.did_work() {
        lines.push("success".to_string());
    } else {
        lines.push("up to date".to_string());
    }
    lines
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
