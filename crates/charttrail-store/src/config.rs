//! TOML-driven store configuration.
//!
//! Loaded the same way policy files are in comparable systems: parse a TOML
//! document into a serde struct, mapping failures to `ConfigError`.  Every
//! field has a default so an empty document is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use charttrail_contracts::{TrailError, TrailResult};

/// Configuration for the log store and redaction caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Directory holding live logs, rotated segments, and tip sidecars.
    pub log_dir: PathBuf,

    /// A live file at or above this size is rotated before the next write.
    pub max_file_size_bytes: u64,

    /// Segments with a modification time older than this are deleted.
    pub retention_days: u32,

    /// Bounded wait for the per-file append lock.
    pub lock_timeout_ms: u64,

    /// Soft character cap for top-level messages (redactor truncation).
    pub max_message_len: usize,

    /// Soft character cap for nested context string values.
    pub max_context_value_len: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            max_file_size_bytes: 10 * 1024 * 1024,
            // Seven years, in keeping with HIPAA-style retention policies.
            retention_days: 2555,
            lock_timeout_ms: 250,
            max_message_len: 2000,
            max_context_value_len: 500,
        }
    }
}

impl TrailConfig {
    /// Parse `s` as a TOML configuration document.
    pub fn from_toml_str(s: &str) -> TrailResult<Self> {
        toml::from_str(s).map_err(|e| TrailError::ConfigError {
            reason: format!("failed to parse trail config TOML: {}", e),
        })
    }

    /// Read and parse the TOML file at `path`.
    pub fn from_file(path: &Path) -> TrailResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| TrailError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The retention window in seconds.
    pub fn retention_secs(&self) -> u64 {
        u64::from(self.retention_days) * 24 * 60 * 60
    }
}
