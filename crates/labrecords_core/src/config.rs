//! Record store configuration.
//!
//! # Responsibility
//! - Describe how to reach the storage engine (file or in-memory target).
//! - Carry connection tuning (`busy_timeout_ms`) with sane defaults.
//!
//! # Invariants
//! - A file target must name a non-empty path.
//! - `busy_timeout_ms` is strictly positive.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StoreTarget {
    /// SQLite database file, created when missing.
    File { path: PathBuf },
    /// Private in-memory database, dropped with the store.
    Memory,
}

/// Configuration object handed to the record store at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub target: StoreTarget,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyPath,
    ZeroBusyTimeout,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "store file path cannot be empty"),
            Self::ZeroBusyTimeout => write!(f, "busy_timeout_ms must be greater than zero"),
        }
    }
}

impl Error for ConfigError {}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl StoreConfig {
    /// File-backed store at `path` with default tuning.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            target: StoreTarget::File {
                path: path.as_ref().to_path_buf(),
            },
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// In-memory store with default tuning.
    pub fn in_memory() -> Self {
        Self {
            target: StoreTarget::Memory,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Short label for log lines (`file` or `memory`).
    pub fn mode(&self) -> &'static str {
        match self.target {
            StoreTarget::File { .. } => "file",
            StoreTarget::Memory => "memory",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let StoreTarget::File { path } = &self.target {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyPath);
            }
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::ZeroBusyTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, StoreTarget, DEFAULT_BUSY_TIMEOUT_MS};
    use std::path::PathBuf;

    #[test]
    fn deserialize_applies_default_timeout() {
        let config: StoreConfig = serde_json::from_value(serde_json::json!({
            "target": { "mode": "file", "path": "/var/lib/labrecords/lab.db" }
        }))
        .unwrap();

        assert_eq!(
            config.target,
            StoreTarget::File {
                path: PathBuf::from("/var/lib/labrecords/lab.db")
            }
        );
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(config.mode(), "file");
    }

    #[test]
    fn deserialize_memory_target() {
        let config: StoreConfig = serde_json::from_value(serde_json::json!({
            "target": { "mode": "memory" },
            "busy_timeout_ms": 250
        }))
        .unwrap();

        assert_eq!(config.target, StoreTarget::Memory);
        assert_eq!(config.busy_timeout().as_millis(), 250);
    }

    #[test]
    fn validate_rejects_empty_path_and_zero_timeout() {
        assert_eq!(
            StoreConfig::file("").validate().unwrap_err(),
            ConfigError::EmptyPath
        );

        let mut config = StoreConfig::in_memory();
        config.busy_timeout_ms = 0;
        assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroBusyTimeout);
    }
}
