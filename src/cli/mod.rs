//! Command-line interface
//!
//! - check-schema: authoring check of a schema file
//! - validate: one-shot submission validation
//! - template: print the starter schema
//! - serve: line-delimited JSON request loop over the engine
//! - submissions: list stored submissions

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_schema, run, run_command, serve, submissions, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
