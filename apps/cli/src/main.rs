//! PlanCheck CLI — automated review of construction plan documents.
//!
//! Extracts a fact record from a plan document, runs the Compliance, Risk
//! and Cost analyzers concurrently, and prints the synthesized verdict.

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
