//! Command-line argument parsing for ride-insights.
//!
//! Uses clap to parse global options and the subcommand to run.

use clap::{Parser, Subcommand};
use ride_insights::app::OutputFormat;
use std::path::PathBuf;

/// Predefined analytical SQL queries over ride-booking records.
#[derive(Parser, Debug)]
#[command(name = "ride-insights")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backing store connection string (e.g., sqlite:data/rides.db)
    #[arg(long, global = true, value_name = "URL")]
    pub database_url: Option<String>,

    /// SQL script executed against the store before the command
    #[arg(long, global = true, value_name = "PATH")]
    pub seed: Option<PathBuf>,

    /// Write logs to the state directory instead of stderr
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List every query in the catalog
    List,

    /// Show one query including its SQL
    Show {
        /// Query id
        id: u32,
    },

    /// Run one query
    Run {
        /// Query id
        id: u32,

        /// Export a successful result as CSV
        #[arg(long)]
        export: bool,

        /// Output format: text or json
        #[arg(long, value_name = "FORMAT", default_value = "text")]
        format: OutputFormat,
    },

    /// Run every query in catalog order
    RunAll {
        /// Output format: text or json
        #[arg(long, value_name = "FORMAT", default_value = "text")]
        format: OutputFormat,
    },

    /// Report catalog entries that are not single read-only queries
    Check,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(ride_insights::config::Config::default_path)
    }
}
