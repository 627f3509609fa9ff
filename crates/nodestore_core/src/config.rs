//! Runtime configuration for node store hosts.
//!
//! # Responsibility
//! - Resolve database and logging settings from environment variables.
//! - Validate values before any store or logger is opened.
//!
//! # Invariants
//! - Missing variables fall back to defaults; present-but-invalid values are
//!   errors, never silently replaced.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Database file path. Unset means an in-memory store.
pub const ENV_DB_PATH: &str = "NODESTORE_DB_PATH";
/// Log level (`trace|debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "NODESTORE_LOG_LEVEL";
/// Absolute log directory. Unset disables file logging.
pub const ENV_LOG_DIR: &str = "NODESTORE_LOG_DIR";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Store and logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let log_level = match non_empty(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value).map_err(|err| ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                message: err.to_string(),
            })?,
            None => default_log_level(),
        };

        let log_dir = match non_empty(ENV_LOG_DIR).map(PathBuf::from) {
            Some(dir) if !dir.is_absolute() => {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    message: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
            other => other,
        };

        Ok(Self {
            db_path: non_empty(ENV_DB_PATH).map(PathBuf::from),
            log_level,
            log_dir,
        })
    }
}
