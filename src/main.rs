//! CLI entry point for the Quip folder exporter.

use anyhow::Result;
use clap::Parser;

mod app;
mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse before tracing so --help and --version print without log noise
    let args = Args::parse();

    // A finished walk exits 0 even when individual items failed; the report lists them.
    app::runtime::run_export(args).await?;
    Ok(())
}
