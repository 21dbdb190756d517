//! Backup restore with the vendor utility (stage 4)

use crate::config::Config;
use crate::observability::{log_event_with_fields, Event};

use super::{os_command, StageContext, StageOutcome, StageResult, Step};

/// The single mysqlbackup invocation.
///
/// The utility talks to the local instance, so the host is always loopback.
pub fn restore_plan(config: &Config) -> Vec<Step> {
    vec![Step::Run(
        os_command(config, "Restoring backup with mysqlbackup", "mysqlbackup").args([
            "--host=127.0.0.1".to_string(),
            format!("--port={}", config.secondary_port),
            format!("--datadir={}", config.data_dir),
            format!("--log_bin={}", config.log_bin_base()),
            format!("--backup-image={}", config.backup_image),
            format!("--backup-dir={}", config.backup_dir),
            "copy-back-and-apply-log".to_string(),
        ]),
    )]
}

pub(super) fn restore(ctx: &mut StageContext<'_>) -> StageResult<StageOutcome> {
    let config = ctx.config;
    log_event_with_fields(
        Event::RestoreSource,
        &[
            ("backup_dir", config.backup_dir.as_str()),
            ("backup_image", config.backup_image.as_str()),
        ],
    );
    println!("Starting backup restoration (this may take a while)...");

    let outcome = ctx.run_plan(&restore_plan(config))?;

    log_event_with_fields(
        Event::RestoreDone,
        &[("backup_path", config.backup_path.as_str())],
    );
    Ok(outcome)
}
