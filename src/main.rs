//! formgate entry point
//!
//! Parses arguments, runs the command, prints any error to stderr and
//! exits non-zero on failure. All logic lives in the `cli` module.

use formgate::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
