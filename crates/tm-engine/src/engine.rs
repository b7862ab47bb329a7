//! Migration run orchestration
//!
//! A run moves through fixed steps: discover files, check the metadata
//! schema, optionally adopt, validate history, then execute whatever lies
//! beyond recorded history. State flows between steps in a [`RunContext`].

use crate::adopt::adopt_through;
use crate::error::{EngineError, EngineResult};
use crate::execute::apply_file;
use crate::history::validate_history;
use crate::upgrade::SchemaUpgrader;
use std::path::PathBuf;
use tm_core::{FileSet, Migration, MigrationFile};
use tm_db::{CheckpointScope, SchemaVersion, Store};

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Metadata schema version upgraded from, if an upgrade happened
    pub schema_upgraded_from: Option<SchemaVersion>,
    /// Files recorded as applied without executing them
    pub adopted: Vec<String>,
    /// Files a dry run would execute
    pub pending: Vec<String>,
    /// Files executed by this run
    pub migrated: Vec<String>,
}

impl RunReport {
    /// Whether any migration file was executed
    pub fn did_work(&self) -> bool {
        !self.migrated.is_empty()
    }
}

/// State accumulated across the steps of one run
#[derive(Debug)]
pub struct RunContext {
    /// Ordered files on disk
    pub files: FileSet,
    /// History as recorded in the store
    pub recorded: Vec<Migration>,
    /// First history position that still needs validation
    pub start: usize,
}

impl RunContext {
    fn new(files: FileSet) -> Self {
        Self {
            files,
            recorded: Vec::new(),
            start: 0,
        }
    }

    /// Files beyond recorded history, in execution order
    pub fn pending(&self) -> &[MigrationFile] {
        self.files.from_index(self.recorded.len())
    }
}

/// Applies a directory of migrations to one store
pub struct MigrationEngine<'a> {
    store: &'a dyn Store,
    dir: PathBuf,
    adopt_through: Option<String>,
    dry_run: bool,
}

impl<'a> MigrationEngine<'a> {
    /// Create an engine for the migrations in `dir`
    pub fn new(store: &'a dyn Store, dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            dir: dir.into(),
            adopt_through: None,
            dry_run: false,
        }
    }

    /// Record every file through `target` as applied before running
    pub fn adopt_through(mut self, target: impl Into<String>) -> Self {
        self.adopt_through = Some(target.into());
        self
    }

    /// Report pending files instead of executing them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Execute the run
    pub async fn run(&self) -> EngineResult<RunReport> {
        if self.dry_run && self.adopt_through.is_some() {
            return Err(EngineError::AdoptionWithDryRun);
        }

        let mut ctx = RunContext::new(FileSet::discover(&self.dir)?);
        log::debug!(
            "Found {} migration file(s) in {}",
            ctx.files.len(),
            self.dir.display()
        );

        let mut report = RunReport {
            schema_upgraded_from: SchemaUpgrader::new(self.store)
                .prepare(&ctx.files)
                .await?,
            ..RunReport::default()
        };

        if let Some(target) = &self.adopt_through {
            report.adopted = adopt_through(self.store, &ctx.files, target).await?;
            ctx.start = report.adopted.len();
        }

        ctx.recorded = self.store.list_migrations().await?;
        validate_history(&ctx.files, &ctx.recorded, ctx.start)?;

        if self.dry_run {
            report.pending = ctx.pending().iter().map(|f| f.name().to_string()).collect();
            return Ok(report);
        }

        self.execute(&ctx, &mut report).await?;
        Ok(report)
    }

    async fn execute(&self, ctx: &RunContext, report: &mut RunReport) -> EngineResult<()> {
        for file in ctx.pending() {
            log::info!("Migrating {}", file.name());
            apply_file(self.store, file).await?;
            report.migrated.push(file.name().to_string());
        }

        self.store.delete_checkpoints(CheckpointScope::All).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
