//! Prospector CLI — company screening and ICP research tool.
//!
//! Screens candidate companies through a staged funnel and researches the
//! survivors into source-attributed business profiles.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
