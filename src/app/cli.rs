//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bottle Scan - two-step bottle validation for recycling rewards
#[derive(Parser, Debug)]
#[command(name = "bottle-scan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scan session over still images
    Scan {
        /// Image for the Identify step
        #[arg(short, long)]
        identify: PathBuf,

        /// Image for the Confirm step (skipped when absent)
        #[arg(short = 'C', long)]
        confirm: Option<PathBuf>,
    },

    /// Run the Identify step alone and print the raw classification
    Identify {
        /// Image to classify
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Manage configuration
    Config {
        /// Config action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default configuration to the default location
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the default config path
    Path,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
