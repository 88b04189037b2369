//! Command line interface definition

use clap::{Parser, Subcommand};
use hotswap_types::InstallMode;
use std::path::PathBuf;

/// hotswap - over-the-air content updates with automatic rollback
#[derive(Parser)]
#[command(name = "hotswap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Over-the-air content updates with automatic rollback")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the data root holding package records and generations
    #[arg(long, global = true, value_name = "DIR")]
    pub data_root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the current and previous package
    Status,

    /// Check for an update, download and install it
    Sync {
        /// Deployment key for this sync only
        #[arg(long)]
        deployment_key: Option<String>,

        /// When to activate a non-mandatory update
        #[arg(long, value_parser = parse_install_mode)]
        install_mode: Option<InstallMode>,

        /// When to activate a mandatory update
        #[arg(long, value_parser = parse_install_mode)]
        mandatory_install_mode: Option<InstallMode>,

        /// Revert unless the new package confirms within this many milliseconds
        #[arg(long, value_name = "MS")]
        rollback_timeout_ms: Option<u64>,

        /// Ask before downloading an update
        #[arg(long)]
        prompt: bool,
    },

    /// Start the host: revert unconfirmed packages, activate staged ones
    Launch,

    /// Confirm the running package is healthy
    NotifyReady,

    /// Reload into the pending package now
    Restart,
}

fn parse_install_mode(value: &str) -> Result<InstallMode, String> {
    value.parse().map_err(|e: hotswap_errors::ConfigError| e.to_string())
}
