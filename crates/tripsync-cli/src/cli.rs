//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// tripsync - Mirror your flight itinerary into a calendar
#[derive(Debug, Parser)]
#[command(name = "tripsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "TRIPSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    pub debug: bool,

    // --- Connection flags ---
    /// Calendar to mirror flights into
    #[arg(long, env = "GOOGLE_CALENDAR_ID")]
    pub calendar: Option<String>,

    /// TripIt username for authentication
    #[arg(long, env = "TRIPIT_USERNAME")]
    pub tripit_username: Option<String>,

    /// TripIt API token for authentication
    #[arg(long, env = "TRIPIT_TOKEN")]
    pub tripit_token: Option<String>,

    /// Path to the Google service account keyfile
    #[arg(long, env = "GOOGLE_KEYFILE")]
    pub google_keyfile: Option<PathBuf>,

    // --- Sync behavior flags ---
    /// Interval between passes (e.g. 30s, 1m, 3h)
    #[arg(long)]
    pub interval: Option<String>,

    /// Run a single pass and exit instead of running as a daemon
    #[arg(long)]
    pub once: bool,

    /// Also mirror trips that lie entirely in the past
    #[arg(long)]
    pub include_past: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
