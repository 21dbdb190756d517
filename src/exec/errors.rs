//! External command errors

use std::io;

use thiserror::Error;

/// Result type for command execution
pub type ExecResult<T> = Result<T, ExecError>;

/// A command could not be run, or ran and failed.
///
/// No distinction is made between transient and permanent failures.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to spawn `{command}`: {err}")]
    Spawn {
        command: String,
        #[source]
        err: io::Error,
    },

    #[error("`{command}` exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
}

impl ExecError {
    /// Rendered command line that failed
    pub fn command(&self) -> &str {
        match self {
            ExecError::Spawn { command, .. } | ExecError::NonZeroExit { command, .. } => command,
        }
    }
}
