//! CLI command implementations
//!
//! Startup order is fixed: install logging, load and validate config, then
//! dispatch on the selected mode. Nothing touches the system before the
//! config has validated.

use std::time::Duration;

use clap::CommandFactory;
use uuid::Uuid;

use crate::config::Config;
use crate::exec::{
    CommandOutput, CommandRunner, CommandSpec, DryRunRunner, ExecResult, SystemRunner,
};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::stages::{
    run_full, run_single, sql_only, AssumeYes, Confirm, StageContext, StdinConfirm,
    WorkflowOutcome,
};

use super::args::{Cli, Mode};
use super::errors::{CliError, CliResult};

/// Parse process arguments and run
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}

/// Boxed header printed on every invocation
pub fn header(config: &Config) -> String {
    let primary = format!("{}:{}", config.primary_host, config.primary_port);
    let secondary = format!("{}:{}", config.secondary_host, config.secondary_port);
    let bar = "═".repeat(70);
    format!(
        "    ╔{bar}╗\n\
         \x20   ║{:^70}║\n\
         \x20   ║{:70}║\n\
         \x20   ║  {:<68}║\n\
         \x20   ║  {:<68}║\n\
         \x20   ╚{bar}╝\n",
        "MySQL Primary-Secondary Replication Setup",
        "",
        format!("Primary:   {}", primary),
        format!("Secondary: {}", secondary),
    )
}

/// Run a parsed invocation
pub fn run_command(cli: Cli) -> CliResult<()> {
    let run_id = Uuid::new_v4().to_string();
    Logger::init(cli.verbose, &run_id, cli.log_file.as_deref())
        .map_err(|e| CliError::io_error(format!("Failed to open log file: {}", e)))?;

    let mode = cli.mode();
    log_event_with_fields(
        Event::RunStart,
        &[
            ("dry_run", if cli.dry_run { "true" } else { "false" }),
            ("mode", mode.as_str()),
        ],
    );

    let config = Config::load_or_default(cli.config.as_deref())?;
    let source = cli
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("source", source.as_str()),
            ("mysql_instance", config.mysql_instance.as_str()),
        ],
    );

    println!("{}", header(&config));

    let mut runner = RunnerChoice::for_cli(&cli);
    let mut prompt = PromptChoice::for_cli(&cli);
    run_mode(&cli, &config, &mut runner, &mut prompt)
}

/// Runner selected by `--dry-run`
#[derive(Debug)]
pub enum RunnerChoice {
    System(SystemRunner),
    DryRun(DryRunRunner),
}

impl RunnerChoice {
    pub fn for_cli(cli: &Cli) -> Self {
        if cli.dry_run {
            RunnerChoice::DryRun(DryRunRunner::new())
        } else {
            RunnerChoice::System(SystemRunner::new())
        }
    }

    /// Commands recorded by a dry run; `None` for the system runner
    pub fn recorded(&self) -> Option<&[String]> {
        match self {
            RunnerChoice::System(_) => None,
            RunnerChoice::DryRun(runner) => Some(runner.commands()),
        }
    }
}

impl CommandRunner for RunnerChoice {
    fn run(&mut self, spec: &CommandSpec) -> ExecResult<CommandOutput> {
        match self {
            RunnerChoice::System(runner) => runner.run(spec),
            RunnerChoice::DryRun(runner) => runner.run(spec),
        }
    }

    fn pause(&mut self, duration: Duration) {
        match self {
            RunnerChoice::System(runner) => runner.pause(duration),
            RunnerChoice::DryRun(runner) => runner.pause(duration),
        }
    }
}

/// Prompt selected by `--yes`
#[derive(Debug)]
pub enum PromptChoice {
    Stdin(StdinConfirm),
    AssumeYes(AssumeYes),
}

impl PromptChoice {
    pub fn for_cli(cli: &Cli) -> Self {
        if cli.yes {
            PromptChoice::AssumeYes(AssumeYes)
        } else {
            PromptChoice::Stdin(StdinConfirm)
        }
    }
}

impl Confirm for PromptChoice {
    fn confirm(&mut self, message: &str) -> bool {
        match self {
            PromptChoice::Stdin(prompt) => prompt.confirm(message),
            PromptChoice::AssumeYes(prompt) => prompt.confirm(message),
        }
    }
}

/// Dispatch on the selected mode with an already loaded config
pub fn run_mode(
    cli: &Cli,
    config: &Config,
    runner: &mut dyn CommandRunner,
    prompt: &mut dyn Confirm,
) -> CliResult<()> {
    match cli.mode() {
        Mode::SqlOnly => {
            println!("{}", sql_only(config)?);
        }
        Mode::Help => {
            Cli::command().print_help()?;
            println!();
        }
        Mode::Step(stage) => {
            run_single(&mut context(cli, config, runner, prompt), stage)?;
        }
        Mode::Full(options) => {
            let outcome = run_full(&mut context(cli, config, runner, prompt), options)?;
            if outcome == WorkflowOutcome::Cancelled {
                println!("Operation cancelled by user");
            }
        }
    }

    Ok(())
}

fn context<'a>(
    cli: &Cli,
    config: &'a Config,
    runner: &'a mut dyn CommandRunner,
    prompt: &'a mut dyn Confirm,
) -> StageContext<'a> {
    StageContext {
        config,
        runner,
        prompt,
        execute_sql: cli.execute_sql,
        dry_run: cli.dry_run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_header_shows_endpoints() {
        let text = header(&Config::default());
        assert!(text.contains("MySQL Primary-Secondary Replication Setup"));
        assert!(text.contains("Primary:   192.168.1.1:3301"));
        assert!(text.contains("Secondary: 192.168.2.1:3301"));
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn test_bad_config_fails_before_any_stage() {
        let cli = Cli {
            full: true,
            yes: true,
            dry_run: true,
            config: Some("/nonexistent/replica-rebuild.json".into()),
            ..Cli::default()
        };
        let err = run_command(cli).unwrap_err();
        assert_eq!(err.code_str(), "REPL_CLI_CONFIG_ERROR");
    }

    /// Config file with a file-backed secret and SQL output inside `dir`
    fn write_config(dir: &TempDir) -> PathBuf {
        let secret = dir.path().join("replication.pw");
        fs::write(&secret, "r3pl-pass\n").unwrap();

        let path = dir.path().join("replica-rebuild.json");
        let json = serde_json::json!({
            "replication_password": {"file": secret},
            "sql_output_path": dir.path().join("out.sql"),
        });
        fs::write(&path, json.to_string()).unwrap();
        path
    }

    #[test]
    fn test_dry_run_selects_recording_runner() {
        let dry = Cli {
            dry_run: true,
            ..Cli::default()
        };
        assert!(matches!(RunnerChoice::for_cli(&dry), RunnerChoice::DryRun(_)));
        assert!(matches!(
            RunnerChoice::for_cli(&Cli::default()),
            RunnerChoice::System(_)
        ));
    }

    #[test]
    fn test_yes_selects_assume_yes() {
        let yes = Cli {
            yes: true,
            ..Cli::default()
        };
        assert!(matches!(PromptChoice::for_cli(&yes), PromptChoice::AssumeYes(_)));
        assert!(matches!(
            PromptChoice::for_cli(&Cli::default()),
            PromptChoice::Stdin(_)
        ));
    }

    #[test]
    fn test_full_dry_run_records_commands_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let cli = Cli {
            full: true,
            dry_run: true,
            yes: true,
            config: Some(write_config(&dir)),
            ..Cli::default()
        };
        let config = Config::load_or_default(cli.config.as_deref()).unwrap();

        let mut runner = RunnerChoice::for_cli(&cli);
        let mut prompt = PromptChoice::for_cli(&cli);
        run_mode(&cli, &config, &mut runner, &mut prompt).unwrap();

        let recorded = runner.recorded().unwrap();
        assert_eq!(recorded.len(), 18);
        assert_eq!(recorded[0], "sudo systemctl status mysqld@mysql1");
        assert_eq!(recorded[4], "sudo rm -rf /u01/data");
        assert!(!dir.path().join("out.sql").exists());
    }

    #[test]
    fn test_run_command_full_dry_run_succeeds() {
        let dir = TempDir::new().unwrap();
        let cli = Cli {
            full: true,
            dry_run: true,
            yes: true,
            config: Some(write_config(&dir)),
            ..Cli::default()
        };

        run_command(cli).unwrap();
        assert!(!dir.path().join("out.sql").exists());
    }
}
