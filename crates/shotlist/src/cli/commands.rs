//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shotlist - turn a creative brief into a storyboard script and prompts
#[derive(Parser, Debug)]
#[command(name = "shotlist")]
#[command(about = "Turn a creative brief into a storyboard script and image prompts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Load configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a script from a brief, then prompts for every group
    Generate {
        /// Creative brief
        #[arg(long)]
        brief: String,

        /// Number of shots (a positive multiple of 4)
        #[arg(long, default_value = "8")]
        shots: usize,

        /// Write the snapshot JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also write the plain-text rendering here
        #[arg(long)]
        text: Option<PathBuf>,
    },

    /// Fill in missing prompts for a snapshot or bundle, or regenerate one group
    Prompts {
        /// Snapshot or bundle JSON file
        #[arg(long)]
        input: PathBuf,

        /// Regenerate this group after filling in missing results
        #[arg(long)]
        group: Option<u32>,

        /// Write the snapshot JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the plain-text rendering of a snapshot
    Render {
        /// Snapshot or bundle JSON file
        #[arg(long)]
        input: PathBuf,
    },
}
