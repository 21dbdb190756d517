//! replica-rebuild CLI entry point
//!
//! This is a minimal entrypoint:
//! 1. Delegates argument parsing and dispatch to `cli::run`
//! 2. Prints errors to stderr
//! 3. Exits with non-zero on failure
//!
//! Config loading, logging setup and stage execution all live in the
//! CLI module.

use replica_rebuild::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
