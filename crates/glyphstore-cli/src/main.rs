//! Glyphstore CLI - glyph lookups over font files from the command line

use clap::Parser;
use glyphstore_cli::cli::{Cli, Commands};
use glyphstore_cli::commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info(args) => commands::info::run(&args),
        Commands::Lookup(args) => commands::lookup::run(&args).await,
    }
}
