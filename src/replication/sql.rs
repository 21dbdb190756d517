//! Replication SQL rendering
//!
//! Produces the annotated script an operator can run by hand, and the bare
//! statement list used when the tool executes it through the mysql client.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::config::{Config, Secret};

/// One executable statement and a label that is safe to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub label: &'static str,
    pub sql: String,
}

/// Escape a value for use inside a single-quoted MySQL string literal.
///
/// Quotes are doubled, which also holds under `NO_BACKSLASH_ESCAPES`.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("''"),
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// `CHANGE REPLICATION SOURCE TO ...` pointing at the primary
pub fn change_source(config: &Config, password: &Secret) -> String {
    format!(
        "CHANGE REPLICATION SOURCE TO\n    \
         SOURCE_HOST='{}',\n    \
         SOURCE_PORT={},\n    \
         SOURCE_USER='{}',\n    \
         SOURCE_PASSWORD='{}',\n    \
         SOURCE_AUTO_POSITION=1,\n    \
         GET_SOURCE_PUBLIC_KEY=1;",
        escape_literal(&config.primary_host),
        config.primary_port,
        escape_literal(&config.replication_user),
        escape_literal(password.expose()),
    )
}

/// Statements executed against the secondary, in order
pub fn statements(config: &Config, password: &Secret) -> Vec<Statement> {
    vec![
        Statement {
            label: "STOP REPLICA",
            sql: "STOP REPLICA;".to_string(),
        },
        Statement {
            label: "RESET REPLICA ALL",
            sql: "RESET REPLICA ALL;".to_string(),
        },
        Statement {
            label: "CHANGE REPLICATION SOURCE TO",
            sql: change_source(config, password),
        },
        Statement {
            label: "START REPLICA",
            sql: "START REPLICA;".to_string(),
        },
        Statement {
            label: "SHOW REPLICA STATUS",
            sql: "SHOW REPLICA STATUS\\G".to_string(),
        },
    ]
}

const RULE: &str =
    "-- ================================================================================";

/// The full annotated script shown to the operator and written to disk
pub fn render_script(config: &Config, password: &Secret) -> String {
    let mut sql = String::new();

    sql.push('\n');
    sql.push_str(RULE);
    sql.push_str("\n-- MySQL REPLICATION CONFIGURATION\n");
    sql.push_str(&format!(
        "-- Run these commands on the SECONDARY server ({}:{})\n",
        config.secondary_host, config.secondary_port
    ));
    sql.push_str(RULE);
    sql.push_str("\n\n");

    sql.push_str("-- Step 7.1: Check current replica status\nSHOW REPLICA STATUS;\n\n");
    sql.push_str("-- Step 7.2: Stop any existing replication\nSTOP REPLICA;\n\n");
    sql.push_str("-- Step 7.3: Reset replica configuration\nRESET REPLICA ALL;\n\n");
    sql.push_str("-- Step 7.4: Configure replication source (Primary server)\n");
    sql.push_str(&change_source(config, password));
    sql.push_str("\n\n");
    sql.push_str("-- Step 7.5: Start replication\nSTART REPLICA;\n\n");
    sql.push_str("-- Step 7.6: Verify replication status\nSHOW REPLICA STATUS\\G\n\n");

    sql.push_str(RULE);
    sql.push_str("\n-- EXPECTED OUTPUT:\n");
    sql.push_str("--   Replica_IO_Running: Yes\n");
    sql.push_str("--   Replica_SQL_Running: Yes\n");
    sql.push_str("--   Seconds_Behind_Source: 0 (or small number)\n");
    sql.push_str(RULE);
    sql.push('\n');

    sql
}

/// Write the script readable by the owner only; it contains a password.
pub fn write_script(path: &Path, sql: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // mode() only applies to newly created files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(sql.as_bytes())?;
    file.sync_all()
}
