//! Rebuild stages
//!
//! The rebuild is seven stages run strictly in order:
//!
//! 1. Stop the secondary's service
//! 2. Delete the old data and binlog directories (after confirmation)
//! 3. Recreate them with fixed ownership and mode
//! 4. Restore the backup image with mysqlbackup
//! 5. Re-apply ownership and mode
//! 6. Start the service
//! 7. Render (and optionally execute) the replication SQL
//!
//! Most stages are a fixed `Step` plan derived from the config. The first
//! checked command that fails aborts the stage and the run.

mod configure;
mod directories;
mod errors;
mod prompt;
mod restore;
mod service;
mod workflow;

pub use configure::{configure_replication, sql_only};
pub use directories::{create_plan, delete_plan, permissions_plan};
pub use errors::{StageError, StageErrorCode, StageResult};
pub use prompt::{AssumeYes, Confirm, StdinConfirm};
pub use restore::restore_plan;
pub use service::{start_plan, stop_plan};
pub use workflow::{run_full, run_single, summary, WorkflowOptions, WorkflowOutcome};

use std::fmt;
use std::time::Duration;

use crate::config::Config;
use crate::exec::{execute, settle, CommandRunner, CommandSpec};
use crate::observability::ObservationScope;

/// One rebuild stage, numbered as the operator sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    StopService,
    DeleteDirectories,
    CreateDirectories,
    RestoreBackup,
    SetPermissions,
    StartService,
    ConfigureReplication,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 7] = [
        Stage::StopService,
        Stage::DeleteDirectories,
        Stage::CreateDirectories,
        Stage::RestoreBackup,
        Stage::SetPermissions,
        Stage::StartService,
        Stage::ConfigureReplication,
    ];

    /// 1-based step number
    pub fn number(&self) -> u8 {
        match self {
            Stage::StopService => 1,
            Stage::DeleteDirectories => 2,
            Stage::CreateDirectories => 3,
            Stage::RestoreBackup => 4,
            Stage::SetPermissions => 5,
            Stage::StartService => 6,
            Stage::ConfigureReplication => 7,
        }
    }

    pub fn from_number(number: u8) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.number() == number)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::StopService => "Stop MySQL Instance",
            Stage::DeleteDirectories => "Delete Old Directories",
            Stage::CreateDirectories => "Create Directories",
            Stage::RestoreBackup => "Restore Backup",
            Stage::SetPermissions => "Set Permissions",
            Stage::StartService => "Start MySQL Instance",
            Stage::ConfigureReplication => "Configure Replication",
        }
    }

    /// Section header printed when the stage starts
    pub fn title(&self) -> &'static str {
        match self {
            Stage::StopService => "STEP 1: STOP MYSQL INSTANCE",
            Stage::DeleteDirectories => "STEP 2: DELETE OLD DATA DIRECTORIES",
            Stage::CreateDirectories => "STEP 3: CREATE DIRECTORIES WITH PERMISSIONS",
            Stage::RestoreBackup => "STEP 4: RESTORE MYSQL BACKUP",
            Stage::SetPermissions => "STEP 5: SET FINAL PERMISSIONS",
            Stage::StartService => "STEP 6: START MYSQL INSTANCE",
            Stage::ConfigureReplication => "STEP 7: CONFIGURE REPLICATION",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.name())
    }
}

/// How a stage ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    /// Operator declined a confirmation
    Skipped,
}

/// One element of a stage plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run(CommandSpec),
    Settle(Duration),
}

/// Everything a stage needs from the outside
pub struct StageContext<'a> {
    pub config: &'a Config,
    pub runner: &'a mut dyn CommandRunner,
    pub prompt: &'a mut dyn Confirm,
    /// Execute the replication SQL instead of only rendering it
    pub execute_sql: bool,
    /// Commands are not really run; local files are not written either
    pub dry_run: bool,
}

impl StageContext<'_> {
    /// Run plan steps in order; the first checked failure stops the plan
    pub fn run_plan(&mut self, plan: &[Step]) -> StageResult<StageOutcome> {
        for step in plan {
            match step {
                Step::Run(spec) => {
                    execute(&mut *self.runner, spec)?;
                }
                Step::Settle(duration) => settle(&mut *self.runner, *duration),
            }
        }
        Ok(StageOutcome::Completed)
    }
}

/// A command built from config, with sudo applied per config
pub(crate) fn os_command(
    config: &Config,
    description: impl Into<String>,
    program: &str,
) -> CommandSpec {
    CommandSpec::new(description, program).sudo(config.use_sudo)
}

/// Print a section header to stdout
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(70));
    println!("  {}", title);
    println!("{}", "=".repeat(70));
}

/// Run one stage inside an observation scope
pub fn run_stage(ctx: &mut StageContext<'_>, stage: Stage) -> StageResult<StageOutcome> {
    let number = stage.number().to_string();
    let scope = ObservationScope::with_fields(
        "STAGE",
        &[("stage", number.as_str()), ("name", stage.name())],
    );

    print_section(stage.title());

    let config = ctx.config;
    let result = match stage {
        Stage::StopService => ctx.run_plan(&stop_plan(config)),
        Stage::DeleteDirectories => directories::delete(ctx),
        Stage::CreateDirectories => ctx.run_plan(&create_plan(config)),
        Stage::RestoreBackup => restore::restore(ctx),
        Stage::SetPermissions => ctx.run_plan(&permissions_plan(config)),
        Stage::StartService => ctx.run_plan(&start_plan(config)),
        Stage::ConfigureReplication => configure_replication(ctx),
    }
    .map_err(|e| e.in_stage(stage));

    match &result {
        Ok(StageOutcome::Completed) => scope.complete(),
        Ok(StageOutcome::Skipped) => scope.complete_with_fields(&[("outcome", "skipped")]),
        Err(e) => scope.fail(&e.to_string()),
    }

    result
}
