//! CLI argument definitions using clap
//!
//! - replica-rebuild --full [--skip-delete] [--skip-restore]
//! - replica-rebuild --step <1-7>
//! - replica-rebuild --sql-only

use clap::Parser;
use std::path::PathBuf;

use crate::stages::{Stage, WorkflowOptions};

const AFTER_HELP: &str = "\
Examples:
  # Run full workflow
  replica-rebuild --full

  # Run specific step
  replica-rebuild --step 1

  # Skip deletion and restore
  replica-rebuild --full --skip-delete --skip-restore

  # Generate SQL only
  replica-rebuild --sql-only

Steps:
  1. Stop MySQL Instance
  2. Delete Old Directories
  3. Create Directories
  4. Restore Backup
  5. Set Permissions
  6. Start MySQL Instance
  7. Configure Replication";

/// Rebuild a MySQL secondary from a hot backup and point it at its primary
#[derive(Parser, Debug, Default)]
#[command(name = "replica-rebuild")]
#[command(version, about, long_about = None, after_help = AFTER_HELP)]
pub struct Cli {
    /// Run full workflow
    #[arg(long)]
    pub full: bool,

    /// Run specific step (1-7)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=7))]
    pub step: Option<u8>,

    /// Skip directory deletion step
    #[arg(long)]
    pub skip_delete: bool,

    /// Skip backup restore step
    #[arg(long)]
    pub skip_restore: bool,

    /// Only generate replication SQL
    #[arg(long)]
    pub sql_only: bool,

    /// Print commands without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Execute the replication SQL through the mysql client in step 7
    #[arg(long)]
    pub execute_sql: bool,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Path to JSON configuration file (built-in defaults if omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log rendered command lines
    #[arg(long, short)]
    pub verbose: bool,
}

/// What the invocation asks for, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SqlOnly,
    Step(Stage),
    Full(WorkflowOptions),
    Help,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::SqlOnly => "sql-only",
            Mode::Step(_) => "step",
            Mode::Full(_) => "full",
            Mode::Help => "help",
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// `--sql-only` wins over `--step`, which wins over `--full`
    pub fn mode(&self) -> Mode {
        if self.sql_only {
            return Mode::SqlOnly;
        }
        if let Some(stage) = self.step.and_then(Stage::from_number) {
            return Mode::Step(stage);
        }
        if self.full {
            return Mode::Full(WorkflowOptions {
                skip_delete: self.skip_delete,
                skip_restore: self.skip_restore,
            });
        }
        Mode::Help
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("replica-rebuild").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_no_args_is_help() {
        assert_eq!(parse(&[]).mode(), Mode::Help);
    }

    #[test]
    fn test_full_with_skips() {
        let cli = parse(&["--full", "--skip-delete", "--skip-restore"]);
        assert_eq!(
            cli.mode(),
            Mode::Full(WorkflowOptions {
                skip_delete: true,
                skip_restore: true,
            })
        );
    }

    #[test]
    fn test_step_selects_stage() {
        assert_eq!(
            parse(&["--step", "4"]).mode(),
            Mode::Step(Stage::RestoreBackup)
        );
    }

    #[test]
    fn test_step_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["replica-rebuild", "--step", "0"]).is_err());
        assert!(Cli::try_parse_from(["replica-rebuild", "--step", "8"]).is_err());
        assert!(Cli::try_parse_from(["replica-rebuild", "--step", "x"]).is_err());
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse(&["--sql-only", "--step", "2", "--full"]).mode(),
            Mode::SqlOnly
        );
        assert_eq!(
            parse(&["--step", "2", "--full"]).mode(),
            Mode::Step(Stage::DeleteDirectories)
        );
    }

    #[test]
    fn test_ambient_flags() {
        let cli = parse(&[
            "--full",
            "--dry-run",
            "-y",
            "--execute-sql",
            "--config",
            "/etc/replica-rebuild.json",
            "--log-file",
            "/var/log/replica-rebuild.log",
            "-v",
        ]);
        assert!(cli.dry_run && cli.yes && cli.execute_sql && cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/replica-rebuild.json")));
        assert_eq!(
            cli.log_file,
            Some(PathBuf::from("/var/log/replica-rebuild.log"))
        );
    }
}
