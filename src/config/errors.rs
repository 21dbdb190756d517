//! Configuration errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {err}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Secret from {origin} unavailable: {reason}")]
    SecretUnavailable { origin: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
