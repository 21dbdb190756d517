//! Static run configuration
//!
//! Read once at startup from an optional JSON file, validated, and never
//! mutated afterwards. Missing fields fall back to the built-in defaults.
//!
//! ```json
//! {
//!   "primary_host": "192.168.1.1",
//!   "primary_port": 3301,
//!   "data_dir": "/u01/data",
//!   "replication_password": {"file": "/etc/mysql/replication.pw"}
//! }
//! ```

mod errors;
mod secret;

pub use errors::{ConfigError, ConfigResult};
pub use secret::{Secret, SecretRef};

use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Configuration for one secondary rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // Servers
    pub primary_host: String,
    pub primary_port: u16,
    pub secondary_host: String,
    pub secondary_port: u16,

    /// systemd unit of the secondary instance
    pub mysql_instance: String,

    // Paths
    pub data_dir: String,
    pub binlog_dir: String,
    pub backup_image: String,
    pub backup_dir: String,
    pub backup_path: String,

    // Ownership
    pub mysql_user: String,
    pub mysql_group: String,
    /// Octal mode applied to data and binlog directories
    pub dir_permissions: String,

    // Replication
    pub replication_user: String,
    pub replication_password: SecretRef,

    /// Account used when executing the SQL through the mysql client
    pub admin_user: String,
    pub admin_password: SecretRef,

    /// Where the rendered replication SQL is written
    pub sql_output_path: String,

    /// Prefix OS commands with sudo
    pub use_sudo: bool,

    pub stop_settle_secs: u64,
    pub start_settle_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_host: "192.168.1.1".to_string(),
            primary_port: 3301,
            secondary_host: "192.168.2.1".to_string(),
            secondary_port: 3301,
            mysql_instance: "mysqld@mysql1".to_string(),
            data_dir: "/u01/data".to_string(),
            binlog_dir: "/u01/data/mysql1_binlog".to_string(),
            backup_image: "/u01/data/mysqldata/ebackup.mbi".to_string(),
            backup_dir: "/u01/data/mysqldata/backup-tmp1".to_string(),
            backup_path: "/u01/data/mysqldata/".to_string(),
            mysql_user: "mysql".to_string(),
            mysql_group: "mysql".to_string(),
            dir_permissions: "750".to_string(),
            replication_user: "replicationuser".to_string(),
            replication_password: SecretRef::Env("REPLICATION_PASSWORD".to_string()),
            admin_user: "root".to_string(),
            admin_password: SecretRef::Env("MYSQL_ADMIN_PASSWORD".to_string()),
            sql_output_path: "/tmp/configure_replication.sql".to_string(),
            use_sudo: true,
            stop_settle_secs: 3,
            start_settle_secs: 5,
        }
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.@-]+$").expect("static pattern"))
}

fn mode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-7]{3,4}$").expect("static pattern"))
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            err,
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else validated defaults
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Validate every field.
    ///
    /// Names end up inside SQL literals and command arguments, so they are
    /// restricted to a conservative character set.
    pub fn validate(&self) -> ConfigResult<()> {
        let names: [(&'static str, &str); 7] = [
            ("primary_host", self.primary_host.as_str()),
            ("secondary_host", self.secondary_host.as_str()),
            ("mysql_instance", self.mysql_instance.as_str()),
            ("mysql_user", self.mysql_user.as_str()),
            ("mysql_group", self.mysql_group.as_str()),
            ("replication_user", self.replication_user.as_str()),
            ("admin_user", self.admin_user.as_str()),
        ];
        for (field, value) in names {
            if !name_pattern().is_match(value) {
                return Err(ConfigError::invalid(
                    field,
                    format!("'{}' must be non-empty and match [A-Za-z0-9_.@-]", value),
                ));
            }
        }

        for (field, port) in [
            ("primary_port", self.primary_port),
            ("secondary_port", self.secondary_port),
        ] {
            if port == 0 {
                return Err(ConfigError::invalid(field, "must be > 0"));
            }
        }

        let paths: [(&'static str, &str); 6] = [
            ("data_dir", self.data_dir.as_str()),
            ("binlog_dir", self.binlog_dir.as_str()),
            ("backup_image", self.backup_image.as_str()),
            ("backup_dir", self.backup_dir.as_str()),
            ("backup_path", self.backup_path.as_str()),
            ("sql_output_path", self.sql_output_path.as_str()),
        ];
        for (field, value) in paths {
            if value.is_empty() {
                return Err(ConfigError::invalid(field, "must be non-empty"));
            }
            if !Path::new(value).is_absolute() {
                return Err(ConfigError::invalid(
                    field,
                    format!("'{}' must be an absolute path", value),
                ));
            }
        }

        // These two are removed with rm -rf
        for (field, value) in [("data_dir", &self.data_dir), ("binlog_dir", &self.binlog_dir)] {
            if value.trim_end_matches('/').is_empty() {
                return Err(ConfigError::invalid(field, "refusing to use the filesystem root"));
            }
        }

        if !mode_pattern().is_match(&self.dir_permissions) {
            return Err(ConfigError::invalid(
                "dir_permissions",
                format!("'{}' is not an octal mode", self.dir_permissions),
            ));
        }

        Ok(())
    }

    /// `user:group` for chown
    pub fn owner(&self) -> String {
        format!("{}:{}", self.mysql_user, self.mysql_group)
    }

    /// Binary log base name passed to the restore utility
    pub fn log_bin_base(&self) -> String {
        format!("{}/mysql-bin", self.binlog_dir.trim_end_matches('/'))
    }

    pub fn stop_settle(&self) -> Duration {
        Duration::from_secs(self.stop_settle_secs)
    }

    pub fn start_settle(&self) -> Duration {
        Duration::from_secs(self.start_settle_secs)
    }
}
