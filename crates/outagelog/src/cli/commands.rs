//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::event::EventId;
use crate::geo::GeoPoint;

/// Record command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Where the outage happened (street, neighbourhood, city, postal code)
    #[arg(short, long)]
    pub location: String,

    /// How long the power was out, e.g. "3 hours"
    #[arg(short, long)]
    pub duration: String,

    /// What the outage damaged
    #[arg(long)]
    pub damages: String,

    /// Coordinates of the outage as "lat,lon", instead of geocoding the location
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub at: Option<GeoPoint>,

    /// Record without coordinates if the location cannot be geocoded
    #[arg(long, conflicts_with = "at")]
    pub unlocated: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Your position as "lat,lon"; events are sorted nearest first
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub from: Option<GeoPoint>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Event id
    pub id: EventId,

    /// Your position as "lat,lon", to show how far away the event was
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub from: Option<GeoPoint>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Remove command arguments.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Event id
    pub id: EventId,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Distance command arguments.
#[derive(Debug, Args)]
pub struct DistanceCommand {
    /// First point as "lat,lon"
    #[arg(allow_hyphen_values = true)]
    pub from: GeoPoint,

    /// Second point as "lat,lon"
    #[arg(allow_hyphen_values = true)]
    pub to: GeoPoint,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One event per line
    Plain,
    /// Aligned columns
    #[default]
    Table,
    /// JSON array of stored events; geocoded positions appear as resolvedCoordinates
    Json,
}
