//! Data and binlog directory handling (stages 2, 3 and 5)

use crate::config::Config;
use crate::exec::CommandSpec;
use crate::observability::{log_event_with_fields, Event, Logger};

use super::{os_command, StageContext, StageOutcome, StageResult, Step};

fn chown(config: &Config, description: String, dir: &str) -> CommandSpec {
    os_command(config, description, "chown").args(["-R".to_string(), config.owner(), dir.to_string()])
}

fn chmod(config: &Config, description: String, dir: &str) -> CommandSpec {
    os_command(config, description, "chmod").args([config.dir_permissions.as_str(), dir])
}

fn mkdir(config: &Config, description: String, dir: &str) -> CommandSpec {
    os_command(config, description, "mkdir").args(["-p", dir])
}

/// Remove the binlog directory, then the data directory
pub fn delete_plan(config: &Config) -> Vec<Step> {
    vec![
        Step::Run(
            os_command(
                config,
                format!("Deleting binlog directory: {}", config.binlog_dir),
                "rm",
            )
            .args(["-rf", config.binlog_dir.as_str()]),
        ),
        Step::Run(
            os_command(
                config,
                format!("Deleting data directory: {}", config.data_dir),
                "rm",
            )
            .args(["-rf", config.data_dir.as_str()]),
        ),
    ]
}

/// Recreate both directories with ownership and mode
pub fn create_plan(config: &Config) -> Vec<Step> {
    let owner = config.owner();
    let mode = &config.dir_permissions;
    vec![
        Step::Run(mkdir(
            config,
            format!("Creating data directory: {}", config.data_dir),
            &config.data_dir,
        )),
        Step::Run(chown(
            config,
            format!("Setting ownership to {}", owner),
            &config.data_dir,
        )),
        Step::Run(chmod(
            config,
            format!("Setting permissions to {}", mode),
            &config.data_dir,
        )),
        Step::Run(mkdir(
            config,
            format!("Creating binlog directory: {}", config.binlog_dir),
            &config.binlog_dir,
        )),
        Step::Run(chmod(
            config,
            format!("Setting binlog permissions to {}", mode),
            &config.binlog_dir,
        )),
        Step::Run(chown(
            config,
            "Setting binlog ownership".to_string(),
            &config.binlog_dir,
        )),
    ]
}

/// Re-apply ownership and mode after the restore wrote new files
pub fn permissions_plan(config: &Config) -> Vec<Step> {
    vec![
        Step::Run(chown(
            config,
            format!("Setting ownership on {}", config.data_dir),
            &config.data_dir,
        )),
        Step::Run(chmod(
            config,
            format!("Setting permissions on {}", config.data_dir),
            &config.data_dir,
        )),
        Step::Run(chmod(
            config,
            format!("Setting permissions on {}", config.binlog_dir),
            &config.binlog_dir,
        )),
        Step::Run(chown(
            config,
            format!("Setting ownership on {}", config.binlog_dir),
            &config.binlog_dir,
        )),
    ]
}

/// Stage 2: destructive, so the operator must confirm first.
///
/// Declining skips the deletion; it is not a failure.
pub(super) fn delete(ctx: &mut StageContext<'_>) -> StageResult<StageOutcome> {
    Logger::warn(
        Event::DestructiveWarning.as_str(),
        &[
            ("binlog_dir", ctx.config.binlog_dir.as_str()),
            ("data_dir", ctx.config.data_dir.as_str()),
        ],
    );

    if !ctx
        .prompt
        .confirm("Delete all data in binlog and data directories?")
    {
        log_event_with_fields(
            Event::StageSkipped,
            &[("stage", "2"), ("reason", "user cancelled")],
        );
        return Ok(StageOutcome::Skipped);
    }

    let config = ctx.config;
    ctx.run_plan(&delete_plan(config))
}
