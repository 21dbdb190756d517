//! Command runners
//!
//! The runner is the only place the process touches the outside world:
//! spawning programs and sleeping. Stages talk to the trait so a dry run
//! or a test can stand in for the real system.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use super::command::{CommandOutput, CommandSpec, SIGNAL_EXIT_CODE, STDIN_FAILED_EXIT_CODE};
use super::errors::{ExecError, ExecResult};

/// Runs external commands and waits
pub trait CommandRunner {
    /// Run one command to completion and capture its output.
    ///
    /// Returns `Err` only if the program could not be started. A non-zero
    /// exit is reported in `CommandOutput::code`.
    fn run(&mut self, spec: &CommandSpec) -> ExecResult<CommandOutput>;

    /// Block for a fixed settle time
    fn pause(&mut self, duration: Duration);
}

/// Runs commands on the local system. No shell is involved.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> ExecResult<CommandOutput> {
        let mut argv = spec.argv().into_iter();
        let program = argv.next().unwrap_or_default();

        let spawn_error = |err: std::io::Error| ExecError::Spawn {
            command: spec.render(),
            err,
        };

        let mut command = Command::new(program);
        command
            .args(argv)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if spec.stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        for (name, value) in spec.env() {
            command.env(name, value.expose());
        }

        let mut child = command.spawn().map_err(spawn_error)?;

        // The pipe is dropped at the end of the match so the child sees EOF
        let delivered = match (spec.stdin(), child.stdin.take()) {
            (Some(input), Some(mut pipe)) => pipe
                .write_all(input.expose().as_bytes())
                .and_then(|_| pipe.write_all(b"\n")),
            _ => Ok(()),
        };

        // Always reap the child so its exit status and stderr survive a
        // broken pipe (e.g. mysql exiting early on an auth failure)
        let output = child.wait_with_output().map_err(spawn_error)?;
        let mut code = output.status.code().unwrap_or(SIGNAL_EXIT_CODE);
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if let Err(err) = delivered {
            // Input never fully arrived, so a clean exit is still a failure
            if code == 0 {
                code = STDIN_FAILED_EXIT_CODE;
            }
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!("failed to write stdin: {}", err));
        }

        Ok(CommandOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }

    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Records commands instead of running them; every command succeeds.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    commands: Vec<String>,
    paused: Duration,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered commands in the order they would have run
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Total settle time that was skipped
    pub fn paused(&self) -> Duration {
        self.paused
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&mut self, spec: &CommandSpec) -> ExecResult<CommandOutput> {
        let rendered = spec.render();
        println!("[dry-run] {}", rendered);
        self.commands.push(rendered);
        Ok(CommandOutput::success())
    }

    fn pause(&mut self, duration: Duration) {
        self.paused += duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;

    #[test]
    fn test_system_runner_captures_output() {
        let spec = CommandSpec::new("echo", "sh").args(["-c", "echo out; echo err >&2"]);
        let output = SystemRunner::new().run(&spec).unwrap();
        assert!(output.is_success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn test_system_runner_reports_exit_code() {
        let spec = CommandSpec::new("exit 3", "sh").args(["-c", "exit 3"]);
        let output = SystemRunner::new().run(&spec).unwrap();
        assert_eq!(output.code, 3);
    }

    #[test]
    fn test_system_runner_passes_secret_env() {
        let spec = CommandSpec::new("env", "sh")
            .args(["-c", "printf %s \"$MYSQL_PWD\""])
            .secret_env("MYSQL_PWD", Secret::new("hunter2"));
        let output = SystemRunner::new().run(&spec).unwrap();
        assert_eq!(output.stdout, "hunter2");
    }

    #[test]
    fn test_system_runner_feeds_stdin() {
        let spec = CommandSpec::new("cat", "cat").secret_stdin(Secret::new("STOP REPLICA;"));
        let output = SystemRunner::new().run(&spec).unwrap();
        assert_eq!(output.stdout, "STOP REPLICA;\n");
    }

    #[test]
    fn test_system_runner_keeps_stderr_when_child_ignores_stdin() {
        // Larger than a pipe buffer, so the write fails once the child exits
        let input = "x".repeat(1 << 20);
        let spec = CommandSpec::new("auth failure", "sh")
            .args(["-c", "echo 'Access denied for user' >&2; exit 1"])
            .secret_stdin(Secret::new(input));

        let output = SystemRunner::new().run(&spec).unwrap();
        assert_eq!(output.code, 1);
        assert!(output.stderr.contains("Access denied for user"));
        assert!(output.stderr.contains("failed to write stdin"));
    }

    #[test]
    fn test_unread_stdin_with_clean_exit_is_failure() {
        let input = "x".repeat(1 << 20);
        let spec = CommandSpec::new("ignores input", "sh")
            .args(["-c", "exit 0"])
            .secret_stdin(Secret::new(input));

        let output = SystemRunner::new().run(&spec).unwrap();
        assert_eq!(output.code, STDIN_FAILED_EXIT_CODE);
        assert!(!output.is_success());
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let spec = CommandSpec::new("missing", "replica-rebuild-no-such-program");
        let err = SystemRunner::new().run(&spec).unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[test]
    fn test_dry_run_records_and_skips_pauses() {
        let mut runner = DryRunRunner::new();
        let spec = CommandSpec::new("stop", "systemctl")
            .args(["stop", "mysqld@mysql1"])
            .sudo(true);

        assert!(runner.run(&spec).unwrap().is_success());
        runner.pause(Duration::from_secs(3));

        assert_eq!(runner.commands(), ["sudo systemctl stop mysqld@mysql1"]);
        assert_eq!(runner.paused(), Duration::from_secs(3));
    }
}
