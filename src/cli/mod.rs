//! Command-line interface for presence-light.

pub mod auth;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Presence light CLI
#[derive(Parser, Debug)]
#[command(name = "presence-light", version, about = "Presence indicator driven by OAuth device login")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the presence state machine until interrupted
    Run(RunArgs),
    /// Sign in with the device-code flow and store the session
    Login,
    /// Forget the stored session
    Logout,
    /// Print the effective settings as JSON
    Settings,
}

/// Arguments for `presence-light run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Start a device login automatically when no session is stored
    #[arg(long)]
    pub login: bool,

    /// Milliseconds between ticks of the state machine
    #[arg(long, default_value = "50")]
    pub tick_ms: u64,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
