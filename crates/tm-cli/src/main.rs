//! Tidemark CLI - forward-only SQL migrations with checkpointed resume

use anyhow::Result;
use clap::Parser;

mod cli;
mod context;
mod run;

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    run::execute(&cli).await
}
