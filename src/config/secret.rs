//! Secret references
//!
//! Passwords never live in the config file. The config names where to find
//! them: an environment variable or a file readable by the operator.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};

/// Where a secret comes from.
///
/// JSON form: `{"env": "REPLICATION_PASSWORD"}` or
/// `{"file": "/etc/mysql/replication.pw"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretRef {
    Env(String),
    File(PathBuf),
}

impl SecretRef {
    /// Human-readable origin, safe to log
    pub fn origin(&self) -> String {
        match self {
            SecretRef::Env(var) => format!("env:{}", var),
            SecretRef::File(path) => format!("file:{}", path.display()),
        }
    }

    /// Read the secret value.
    ///
    /// For files only the first line is used, without its line terminator.
    pub fn resolve(&self) -> ConfigResult<Secret> {
        let unavailable = |reason: String| ConfigError::SecretUnavailable {
            origin: self.origin(),
            reason,
        };

        let value = match self {
            SecretRef::Env(var) => std::env::var(var).map_err(|e| unavailable(e.to_string()))?,
            SecretRef::File(path) => {
                let content = fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
                content.lines().next().unwrap_or("").to_string()
            }
        };

        if value.is_empty() {
            return Err(unavailable("value is empty".to_string()));
        }

        Ok(Secret(value))
    }
}

/// A resolved secret. Never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// The raw value, for handing to a child process or SQL renderer
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
