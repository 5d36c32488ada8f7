//! Command-line argument parsing for the gateway.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// An audited SQL gateway for operator-submitted statements.
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target registry file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a SQL statement against a configured target and audit it
    Submit {
        /// Name of the target to run against
        #[arg(short, long, value_name = "NAME")]
        target: String,

        /// Full SQL statement text
        #[arg(short, long, value_name = "SQL")]
        query: String,

        /// Operator who submitted the statement
        #[arg(long, value_name = "NAME")]
        submitted_by: String,

        /// Operator who approved the statement
        #[arg(long, value_name = "NAME")]
        approved_by: String,
    },

    /// Export audited executions in a date range as CSV
    Report {
        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long, value_name = "DATE")]
        start: String,

        /// End date (YYYY-MM-DD, inclusive of the whole day)
        #[arg(long, value_name = "DATE")]
        end: String,

        /// Output file ("-" for stdout)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Create the audit store schema if it does not exist
    Init,
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
            .unwrap_or_else(crate::config::Config::default_path)
    }
}
