//! CLI definition.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Decide, prepare and publish releases from Conventional Commits history.
#[derive(Debug, Parser)]
#[command(name = "cadence")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter cadence.toml
    Init(commands::init::InitArgs),

    /// Show the next release without changing anything
    Next(commands::next::NextArgs),

    /// Print the release notes for the next release
    Notes(commands::notes::NotesArgs),

    /// Run the release: verify, prepare, then publish
    Release(commands::release::ReleaseArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args) => commands::init::run(&args),
            Commands::Next(args) => commands::next::run(&args),
            Commands::Notes(args) => commands::notes::run(&args),
            Commands::Release(args) => commands::release::run(&args),
        }
    }
}
