//! CLI definitions for casetrail.

use std::path::PathBuf;

use casetrail_config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};

/// casetrail CLI.
#[derive(Parser)]
#[command(name = "casetrail")]
#[command(about = "Build a merged Notes and Emails timeline for a CRM record")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true, env = "CASETRAIL_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Generate the timeline report for a record
    Generate {
        /// Address of the record page
        #[arg(long)]
        record_url: String,

        /// Where to write the report (default: a timestamped file in the output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not open the finished report in the browser
        #[arg(long)]
        no_open: bool,
    },

    /// Parse a date the way listing dates are parsed
    ParseDate {
        /// Raw date text, e.g. "25/12/2024 09:30"
        text: String,
    },

    /// Load and validate the configuration
    CheckConfig,
}
