//! Replication configuration for the rebuilt secondary
//!
//! This module does not implement replication. It renders the SQL that
//! points the secondary's built-in replication at the primary, and can
//! execute it through the `mysql` command-line client.
//!
//! Statements reach the client on stdin and the admin password through
//! `MYSQL_PWD`, so neither shows up in the process list or in logs.

mod sql;

pub use sql::{change_source, escape_literal, render_script, statements, write_script, Statement};

use crate::config::{Config, Secret};
use crate::exec::{execute, CommandOutput, CommandRunner, CommandSpec, ExecResult};

/// Address the client connects to; the tool runs on the secondary itself
pub const LOCAL_ADDRESS: &str = "127.0.0.1";

/// mysql client invocation for one statement
pub fn client_command(config: &Config, statement: &Statement, admin_password: &Secret) -> CommandSpec {
    CommandSpec::new(format!("Executing: {}", statement.label), "mysql")
        .args([
            "-h".to_string(),
            LOCAL_ADDRESS.to_string(),
            "-P".to_string(),
            config.secondary_port.to_string(),
            "-u".to_string(),
            config.admin_user.clone(),
        ])
        .secret_env("MYSQL_PWD", admin_password.clone())
        .secret_stdin(Secret::new(statement.sql.clone()))
}

/// Execute every replication statement in order, stopping at the first
/// failure. Returns the output of the final status query.
pub fn execute_statements(
    runner: &mut dyn CommandRunner,
    config: &Config,
    replication_password: &Secret,
    admin_password: &Secret,
) -> ExecResult<CommandOutput> {
    let mut last = CommandOutput::success();
    for statement in statements(config, replication_password) {
        let spec = client_command(config, &statement, admin_password);
        last = execute(runner, &spec)?;
    }
    Ok(last)
}

/// Instructions printed after the script when it is not executed.
///
/// `saved` is false when the script was not written (dry run).
pub fn manual_steps(config: &Config, saved: bool) -> String {
    let run_line = if saved {
        format!("Run the SQL commands above (saved to {})", config.sql_output_path)
    } else {
        "Run the SQL commands above (not saved in a dry run)".to_string()
    };
    format!(
        "    1. Login to MySQL Workbench or mysql CLI on secondary server\n\
         \x20   2. Connect to: {}:{}\n\
         \x20   3. {}\n\
         \x20   4. Verify replication is working with: SHOW REPLICA STATUS\\G\n\
         \n\
         \x20   Expected result:\n\
         \x20   - Replica_IO_Running: Yes\n\
         \x20   - Replica_SQL_Running: Yes\n",
        LOCAL_ADDRESS, config.secondary_port, run_line
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::DryRunRunner;

    #[test]
    fn test_client_command_hides_secrets() {
        let config = Config::default();
        let statement = &statements(&config, &Secret::new("repl-pw"))[2];
        let spec = client_command(&config, statement, &Secret::new("admin-pw"));

        assert_eq!(spec.render(), "mysql -h 127.0.0.1 -P 3301 -u root");
        assert_eq!(spec.description(), "Executing: CHANGE REPLICATION SOURCE TO");
        assert!(spec.stdin().unwrap().expose().contains("SOURCE_PASSWORD='repl-pw'"));
        assert_eq!(spec.env()[0].0, "MYSQL_PWD");
        assert_eq!(spec.env()[0].1.expose(), "admin-pw");
    }

    #[test]
    fn test_execute_statements_runs_five_commands() {
        let mut runner = DryRunRunner::new();
        execute_statements(
            &mut runner,
            &Config::default(),
            &Secret::new("repl-pw"),
            &Secret::new("admin-pw"),
        )
        .unwrap();

        assert_eq!(runner.commands().len(), 5);
        assert!(runner.commands().iter().all(|c| !c.starts_with("sudo")));
    }

    #[test]
    fn test_manual_steps_mention_target() {
        let steps = manual_steps(&Config::default(), true);
        assert!(steps.contains("Connect to: 127.0.0.1:3301"));
        assert!(steps.contains("(saved to /tmp/configure_replication.sql)"));
        assert!(steps.contains("SHOW REPLICA STATUS\\G"));
        assert!(steps.contains("Replica_SQL_Running: Yes"));
    }

    #[test]
    fn test_manual_steps_without_saved_script() {
        let steps = manual_steps(&Config::default(), false);
        assert!(!steps.contains("saved to"));
        assert!(!steps.contains("/tmp/configure_replication.sql"));
        assert!(steps.contains("3. Run the SQL commands above"));
    }
}
