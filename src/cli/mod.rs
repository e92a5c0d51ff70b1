//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

pub mod commands;

/// Copy Jira attachments onto matching target issues or TM4J test cases
#[derive(Parser, Debug)]
#[command(name = "attmig", author, version, about, long_about = None)]
pub struct Cli {
    /// Defaults to `migrate` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file (default: ./settings.json)
    #[arg(long, short = 'c', global = true, env = "ATTMIG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Reuse the staging directory from a previous run instead of wiping it
    #[arg(long, global = true)]
    pub keep_staging: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migrate attachments from the source to the target
    Migrate,

    /// Check settings and credentials for both instances
    Validate {
        /// Only parse and check the settings file, no network requests
        #[arg(long)]
        offline: bool,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
