//! CLI argument definitions using clap
//!
//! Commands:
//! - formgate check-schema <file>
//! - formgate validate --schema <file> --submission <file>
//! - formgate template
//! - formgate serve --config <path>
//! - formgate submissions --config <path> [--form <id>] [--limit <n>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// formgate - form schema and submission validation
#[derive(Parser, Debug)]
#[command(name = "formgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a schema file against the authoring rules
    CheckSchema {
        /// Schema JSON file
        file: PathBuf,
    },

    /// Validate a submission file against a schema file
    Validate {
        #[arg(long)]
        schema: PathBuf,

        #[arg(long)]
        submission: PathBuf,
    },

    /// Print the starter schema
    Template,

    /// Answer JSON requests from stdin, one per line
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./formgate.json")]
        config: PathBuf,
    },

    /// List stored submissions, newest first
    Submissions {
        /// Path to configuration file
        #[arg(long, default_value = "./formgate.json")]
        config: PathBuf,

        /// Only this form
        #[arg(long)]
        form: Option<u64>,

        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
