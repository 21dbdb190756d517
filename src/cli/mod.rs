//! CLI module for replica-rebuild
//!
//! Modes, in precedence order:
//! - `--sql-only`: print the replication SQL and exit
//! - `--step N`: run a single stage
//! - `--full`: run all stages after confirmation
//! - otherwise: print help

mod args;
mod commands;
mod errors;

pub use args::{Cli, Mode};
pub use commands::{header, run, run_command, run_mode, PromptChoice, RunnerChoice};
pub use errors::{CliError, CliErrorCode, CliResult};
