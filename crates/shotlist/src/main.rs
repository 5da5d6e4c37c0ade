//! Shotlist CLI binary.
//!
//! - Generate a storyboard snapshot from a brief
//! - Fill in or regenerate prompts for an existing snapshot
//! - Render a snapshot as plain text

use clap::Parser;
use shotlist::{ShotlistConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, generate, prompts, render};

    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ShotlistConfig::from_file(path)?,
        None => ShotlistConfig::load()?,
    };
    init_logging(cli.verbose, config.logging())?;

    match cli.command {
        Commands::Generate {
            brief,
            shots,
            out,
            text,
        } => {
            generate(&config, &brief, shots, out.as_deref(), text.as_deref()).await?;
        }

        Commands::Prompts { input, group, out } => {
            prompts(&config, &input, group, out.as_deref()).await?;
        }

        Commands::Render { input } => {
            render(&input)?;
        }
    }

    Ok(())
}
