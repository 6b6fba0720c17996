// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tuning, loaded from TOML
//!
//! ```toml
//! max_memory_bytes = 536870912
//! worker_count = 3
//! idle_wait = "10ms"
//! commit_mode = "two-phase"
//! max_time_between_flushes = "5m"
//! ```

use crate::checkpoint::CommitMode;
use crate::memory::BLOCK_SIZE_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Byte limit shared by every stream buffer
    pub max_memory_bytes: u64,
    pub block_size_bytes: u64,
    pub worker_count: usize,
    /// Worker sleep when nothing is eligible to flush
    #[serde(with = "humantime_serde")]
    pub idle_wait: Duration,
    /// Applied to records and stream checkpoints that carry no namespace
    pub default_namespace: Option<String>,
    pub commit_mode: CommitMode,
    #[serde(with = "humantime_serde")]
    pub max_time_between_flushes: Option<Duration>,
    /// Added to each record's size estimate for its in-memory wrapper
    pub record_overhead_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: 1024 * 1024 * 1024,
            block_size_bytes: BLOCK_SIZE_BYTES,
            worker_count: 5,
            idle_wait: Duration::from_millis(25),
            default_namespace: None,
            commit_mode: CommitMode::OnePhase,
            max_time_between_flushes: None,
            record_overhead_bytes: 64,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.block_size_bytes == 0 {
            return Err(ConfigError::Invalid(
                "block_size_bytes must be greater than 0".to_string(),
            ));
        }
        if self.max_memory_bytes < self.block_size_bytes {
            return Err(ConfigError::Invalid(format!(
                "max_memory_bytes ({}) is smaller than block_size_bytes ({})",
                self.max_memory_bytes, self.block_size_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
