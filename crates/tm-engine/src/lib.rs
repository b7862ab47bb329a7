//! tm-engine - Migration execution and integrity engine for Tidemark
//!
//! The engine applies an ordered directory of SQL migrations exactly once
//! each. Before running anything new it proves that recorded history still
//! matches the files on disk, and it checkpoints every statement so an
//! interrupted run resumes where it stopped.

pub mod adopt;
pub mod engine;
pub mod error;
pub mod execute;
pub mod history;
pub mod upgrade;

#[cfg(test)]
pub(crate) mod test_utils;

pub use adopt::adopt_through;
pub use engine::{MigrationEngine, RunContext, RunReport};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use execute::apply_file;
pub use history::validate_history;
pub use upgrade::SchemaUpgrader;
