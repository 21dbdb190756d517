//! Replication configuration (stage 7) and SQL-only mode

use std::path::Path;

use crate::config::Config;
use crate::observability::{log_event_with_fields, Event};
use crate::replication::{execute_statements, manual_steps, render_script, write_script};

use super::{print_section, StageContext, StageError, StageOutcome, StageResult};

/// Render the replication script without touching anything
pub fn sql_only(config: &Config) -> StageResult<String> {
    let password = config
        .replication_password
        .resolve()
        .map_err(StageError::secret)?;
    Ok(render_script(config, &password))
}

/// Show the script, save it, then either execute it or print the manual
/// steps an operator has to follow.
pub fn configure_replication(ctx: &mut StageContext<'_>) -> StageResult<StageOutcome> {
    let config = ctx.config;
    let password = config
        .replication_password
        .resolve()
        .map_err(StageError::secret)?;
    let sql = render_script(config, &password);

    println!("\n📋 SQL Commands to run on Secondary server:\n");
    println!("{}", "-".repeat(70));
    println!("{}", sql);
    println!("{}", "-".repeat(70));

    let path = config.sql_output_path.as_str();
    if ctx.dry_run {
        println!("[dry-run] would write SQL script to {}", path);
    } else {
        write_script(Path::new(path), &sql)
            .map_err(|e| StageError::io_error(format!("Failed to write {}", path), e))?;
        log_event_with_fields(Event::SqlWritten, &[("path", path)]);
    }

    if ctx.execute_sql {
        print_section("EXECUTING REPLICATION SQL");
        let admin_password = config
            .admin_password
            .resolve()
            .map_err(StageError::secret)?;
        let status = execute_statements(&mut *ctx.runner, config, &password, &admin_password)?;
        if !status.stdout.is_empty() {
            println!("{}", status.stdout.trim_end());
        }
    } else {
        print_section("MANUAL STEPS REQUIRED:");
        println!("{}", manual_steps(config, !ctx.dry_run));
    }

    Ok(StageOutcome::Completed)
}
