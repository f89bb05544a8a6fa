// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration
//!
//! Supplied by the embedding system, either as TOML or through environment
//! variables layered over the defaults:
//!
//! ```toml
//! lock_timeout = "2m"
//!
//! [busy]
//! poll_interval = "3s"
//! overall_timeout = "5m"
//!
//! [task]
//! poll_interval = "2s"
//! overall_timeout = "20m"
//! ```

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_BUSY_POLL_INTERVAL: &str = "GWLOCK_BUSY_POLL_INTERVAL";
pub const ENV_BUSY_TIMEOUT: &str = "GWLOCK_BUSY_TIMEOUT";
pub const ENV_TASK_POLL_INTERVAL: &str = "GWLOCK_TASK_POLL_INTERVAL";
pub const ENV_TASK_TIMEOUT: &str = "GWLOCK_TASK_TIMEOUT";
pub const ENV_LOCK_TIMEOUT: &str = "GWLOCK_LOCK_TIMEOUT";

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid duration {value:?} in {var}: {reason}")]
    InvalidDuration {
        var: String,
        value: String,
        reason: String,
    },
    #[error("{0} poll interval must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Timing configuration for coordinated mutations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Deadline for acquiring parent locks; `None` waits indefinitely for a
    /// single key
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub lock_timeout: Option<Duration>,
    /// Retry policy for submissions rejected with a busy signal
    pub busy: RetryPolicy,
    /// Poll policy for waiting on accepted tasks
    pub task: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lock_timeout: None,
            busy: RetryPolicy::default(),
            task: RetryPolicy::new(Duration::from_secs(2), Duration::from_secs(20 * 60)),
        }
    }
}

impl CoordinatorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Layer `GWLOCK_*` environment variables over this configuration
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Layer overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let duration = |var: &str| -> Result<Option<Duration>, ConfigError> {
            let Some(value) = lookup(var) else {
                return Ok(None);
            };
            humantime::parse_duration(value.trim())
                .map(Some)
                .map_err(|e| ConfigError::InvalidDuration {
                    var: var.to_string(),
                    value,
                    reason: e.to_string(),
                })
        };

        if let Some(d) = duration(ENV_BUSY_POLL_INTERVAL)? {
            self.busy.poll_interval = d;
        }
        if let Some(d) = duration(ENV_BUSY_TIMEOUT)? {
            self.busy.overall_timeout = d;
        }
        if let Some(d) = duration(ENV_TASK_POLL_INTERVAL)? {
            self.task.poll_interval = d;
        }
        if let Some(d) = duration(ENV_TASK_TIMEOUT)? {
            self.task.overall_timeout = d;
        }
        if let Some(d) = duration(ENV_LOCK_TIMEOUT)? {
            self.lock_timeout = Some(d);
        }

        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.busy.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("busy"));
        }
        if self.task.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("task"));
        }
        Ok(self)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
