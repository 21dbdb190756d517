//! Full and single-step runs

use crate::config::Config;
use crate::observability::{log_event, log_event_with_fields, Event};

use super::{run_stage, Stage, StageContext, StageOutcome, StageResult};

/// Flags that shape a full run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub skip_delete: bool,
    pub skip_restore: bool,
}

impl WorkflowOptions {
    fn skips(&self, stage: Stage) -> bool {
        match stage {
            Stage::DeleteDirectories => self.skip_delete,
            Stage::RestoreBackup => self.skip_restore,
            _ => false,
        }
    }
}

/// How a full run ended when nothing failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Operator declined at the first prompt; nothing ran
    Cancelled,
    /// Every stage ran; lists the stages that were skipped
    Completed { skipped: Vec<Stage> },
}

fn print_banner(title: &str) {
    println!("\n{}", "█".repeat(70));
    println!("  {}", title);
    println!("{}", "█".repeat(70));
}

/// Configuration tree shown before the operator confirms a full run
pub fn summary(config: &Config) -> String {
    format!(
        "    Configuration:\n\
         \x20   ├── Primary Server:   {}:{}\n\
         \x20   ├── Secondary Server: {}:{}\n\
         \x20   ├── MySQL Instance:   {}\n\
         \x20   ├── Data Directory:   {}\n\
         \x20   ├── Binlog Directory: {}\n\
         \x20   └── Backup Image:     {}\n",
        config.primary_host,
        config.primary_port,
        config.secondary_host,
        config.secondary_port,
        config.mysql_instance,
        config.data_dir,
        config.binlog_dir,
        config.backup_image,
    )
}

/// Run all seven stages in order.
///
/// Stops at the first failing stage and returns its error; later stages
/// never run.
pub fn run_full(
    ctx: &mut StageContext<'_>,
    options: WorkflowOptions,
) -> StageResult<WorkflowOutcome> {
    print_banner("MYSQL REPLICATION SETUP - FULL WORKFLOW");
    println!("\n{}", summary(ctx.config));

    if !ctx.prompt.confirm("Proceed with replication setup?") {
        log_event(Event::WorkflowCancelled);
        return Ok(WorkflowOutcome::Cancelled);
    }

    let mut skipped = Vec::new();
    for stage in Stage::ALL {
        let number = stage.number().to_string();

        if options.skips(stage) {
            println!("\n⏭️  Skipping {}", stage.name());
            log_event_with_fields(
                Event::StageSkipped,
                &[("stage", number.as_str()), ("reason", "flag")],
            );
            skipped.push(stage);
            continue;
        }

        match run_stage(ctx, stage) {
            Ok(StageOutcome::Completed) => {}
            Ok(StageOutcome::Skipped) => skipped.push(stage),
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::WorkflowFailed,
                    &[("stage", number.as_str()), ("error", reason.as_str())],
                );
                return Err(e);
            }
        }
    }

    print_banner("✅ WORKFLOW COMPLETED SUCCESSFULLY");
    if !ctx.execute_sql {
        println!("\n⚠️  Don't forget to run the replication SQL commands!");
    }
    log_event(Event::WorkflowComplete);

    Ok(WorkflowOutcome::Completed { skipped })
}

/// Run exactly one stage
pub fn run_single(ctx: &mut StageContext<'_>, stage: Stage) -> StageResult<StageOutcome> {
    println!("\n🔧 Running Step {}: {}", stage.number(), stage.name());
    run_stage(ctx, stage)
}
