//! External command execution
//!
//! Every stage is a list of `CommandSpec`s handed to `execute`, which logs
//! the description, the rendered command line (TRACE) and the outcome. A
//! checked command that exits non-zero becomes an `ExecError` and stops
//! the caller; unchecked commands only log.

mod command;
mod errors;
mod runner;

pub use command::{CommandOutput, CommandSpec, SIGNAL_EXIT_CODE, STDIN_FAILED_EXIT_CODE};
pub use errors::{ExecError, ExecResult};
pub use runner::{CommandRunner, DryRunRunner, SystemRunner};

use std::time::Duration;

use crate::observability::{Event, Logger};

/// Run one command through `runner` with logging and exit-code checking
pub fn execute(runner: &mut dyn CommandRunner, spec: &CommandSpec) -> ExecResult<CommandOutput> {
    let rendered = spec.render();
    Logger::info(
        Event::CommandStart.as_str(),
        &[("description", spec.description())],
    );
    Logger::trace(Event::CommandLine.as_str(), &[("command", rendered.as_str())]);

    let output = match runner.run(spec) {
        Ok(output) => output,
        Err(err) => {
            let reason = err.to_string();
            Logger::error(
                Event::CommandFailed.as_str(),
                &[("command", rendered.as_str()), ("reason", reason.as_str())],
            );
            if spec.is_checked() {
                return Err(err);
            }
            return Ok(CommandOutput::failure(SIGNAL_EXIT_CODE, reason));
        }
    };

    if output.is_success() {
        Logger::info(Event::CommandOk.as_str(), &[("command", rendered.as_str())]);
        return Ok(output);
    }

    let code = output.code.to_string();
    let stderr = output.stderr.trim();
    let fields = [
        ("command", rendered.as_str()),
        ("exit_code", code.as_str()),
        ("stderr", stderr),
    ];

    if spec.is_checked() {
        Logger::error(Event::CommandFailed.as_str(), &fields);
        return Err(ExecError::NonZeroExit {
            command: rendered.clone(),
            code: output.code,
            stderr: stderr.to_string(),
        });
    }

    // Unchecked commands (status probes) are expected to fail sometimes
    Logger::warn(Event::CommandFailed.as_str(), &fields);
    Ok(output)
}

/// Sleep for a settle period through `runner`
pub fn settle(runner: &mut dyn CommandRunner, duration: Duration) {
    let secs = duration.as_secs().to_string();
    Logger::info(Event::SettlePause.as_str(), &[("seconds", secs.as_str())]);
    runner.pause(duration);
}
