//! Observable runbook events
//!
//! Events are explicit and typed. Stage begin/complete/failed lines are
//! emitted by `ObservationScope` and are not listed here.

use std::fmt;

/// Observable events during a rebuild run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Process started, settings installed
    RunStart,
    /// Configuration loaded and validated
    ConfigLoaded,

    // Commands
    /// About to run an external command
    CommandStart,
    /// Rendered command line (TRACE)
    CommandLine,
    /// Command exited zero
    CommandOk,
    /// Command exited non-zero or could not be spawned
    CommandFailed,
    /// Fixed settle pause after service control
    SettlePause,

    // Stages
    /// Stage skipped by flag or declined prompt
    StageSkipped,
    /// Destructive step announced
    DestructiveWarning,
    /// Backup image and scratch dir about to be restored
    RestoreSource,
    /// Restore utility finished
    RestoreDone,

    // Replication
    /// SQL script written to disk
    SqlWritten,

    // Workflow
    /// Operator declined to proceed
    WorkflowCancelled,
    /// All stages finished
    WorkflowComplete,
    /// A stage failed, remaining stages abandoned (FATAL)
    WorkflowFailed,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RunStart => "RUN_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CommandStart => "COMMAND_START",
            Event::CommandLine => "COMMAND_LINE",
            Event::CommandOk => "COMMAND_OK",
            Event::CommandFailed => "COMMAND_FAILED",
            Event::SettlePause => "SETTLE_PAUSE",
            Event::StageSkipped => "STAGE_SKIPPED",
            Event::DestructiveWarning => "DESTRUCTIVE_WARNING",
            Event::RestoreSource => "RESTORE_SOURCE",
            Event::RestoreDone => "RESTORE_DONE",
            Event::SqlWritten => "SQL_WRITTEN",
            Event::WorkflowCancelled => "WORKFLOW_CANCELLED",
            Event::WorkflowComplete => "WORKFLOW_COMPLETE",
            Event::WorkflowFailed => "WORKFLOW_FAILED",
        }
    }

    /// Whether this event ends the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::WorkflowFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
