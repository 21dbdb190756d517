//! Stage error types
//!
//! Every stage error is FATAL: the run stops at the first failure and the
//! remaining stages are abandoned. No retry, no rollback.

use std::error::Error;
use std::fmt;

use crate::config::ConfigError;
use crate::exec::ExecError;

use super::Stage;

/// Stage error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorCode {
    /// An external command failed or could not be started
    ReplStageCommandFailed,
    /// Local file I/O failed (SQL script)
    ReplStageIo,
    /// A required secret could not be resolved
    ReplStageSecret,
}

impl StageErrorCode {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StageErrorCode::ReplStageCommandFailed => "REPL_STAGE_COMMAND_FAILED",
            StageErrorCode::ReplStageIo => "REPL_STAGE_IO",
            StageErrorCode::ReplStageSecret => "REPL_STAGE_SECRET",
        }
    }
}

impl fmt::Display for StageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage error with the stage it happened in
#[derive(Debug)]
pub struct StageError {
    code: StageErrorCode,
    stage: Option<Stage>,
    message: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl StageError {
    fn new(
        code: StageErrorCode,
        message: impl Into<String>,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            code,
            stage: None,
            message: message.into(),
            source,
        }
    }

    /// An external command failed
    pub fn command_failed(err: ExecError) -> Self {
        Self::new(
            StageErrorCode::ReplStageCommandFailed,
            err.to_string(),
            Some(Box::new(err)),
        )
    }

    /// Local I/O failed
    pub fn io_error(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::new(StageErrorCode::ReplStageIo, message, Some(Box::new(err)))
    }

    /// A secret was missing or empty
    pub fn secret(err: ConfigError) -> Self {
        Self::new(
            StageErrorCode::ReplStageSecret,
            err.to_string(),
            Some(Box::new(err)),
        )
    }

    /// Attach the stage, keeping the first one recorded
    pub fn in_stage(mut self, stage: Stage) -> Self {
        self.stage.get_or_insert(stage);
        self
    }

    pub fn code(&self) -> StageErrorCode {
        self.code
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stage errors always end the run
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}", self.code)?;
        if let Some(stage) = self.stage {
            write!(f, " in step {} ({})", stage.number(), stage.name())?;
        }
        write!(f, ": {}", self.message)
    }
}

impl Error for StageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl From<ExecError> for StageError {
    fn from(err: ExecError) -> Self {
        StageError::command_failed(err)
    }
}

/// Result type for stage operations
pub type StageResult<T> = Result<T, StageError>;
