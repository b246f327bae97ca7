//! Command-line interface for outagelog.

mod app;
mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use app::App;
pub use commands::{
    AddCommand, ClearCommand, ConfigCommand, DistanceCommand, ListCommand, OutputFormat,
    RemoveCommand, ShowCommand,
};

use crate::logging::Verbosity;

/// outagelog - Keep a log of power outages and the damage they caused
///
/// Record where an outage happened, how long it lasted and what it damaged,
/// then list past outages by distance from where you are.
#[derive(Debug, Parser)]
#[command(name = "outagelog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a power outage
    Add(AddCommand),

    /// List recorded outages
    List(ListCommand),

    /// Show one outage in full
    Show(ShowCommand),

    /// Delete one outage
    Remove(RemoveCommand),

    /// Delete every recorded outage
    Clear(ClearCommand),

    /// Distance between two points
    Distance(DistanceCommand),

    /// Tips for getting through an outage
    Tips,

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
