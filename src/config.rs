//! Configuration for the triage core.
//!
//! Defaults carry the production constants; every section can be overridden
//! from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Error loading configuration from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub workflow: WorkflowConfig,
    pub pool: PoolConfig,
    pub cache: CacheConfig,
}

impl TriageConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Workflow thresholds and retry policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Minimum classifier confidence before a ticket proceeds without a
    /// human. Adjusted down by customer tier.
    pub confidence_threshold: f64,
    /// Shared retry budget across classification and generation attempts.
    pub max_retries: u32,
    /// Minimum quality score a generated response must reach.
    pub quality_threshold: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.75,
            max_retries: 3,
            quality_threshold: 0.6,
        }
    }
}

/// Worker pool sizing and bookkeeping bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub worker_count: usize,
    /// Task queue capacity; submissions beyond this are rejected.
    pub queue_size: usize,
    /// Completed-task history cap; trimmed to half on overflow.
    pub completed_history_cap: usize,
    /// Failed-task history cap; trimmed to half on overflow.
    pub failed_history_cap: usize,
    /// Poll interval for status waits, in milliseconds.
    pub poll_interval_ms: u64,
}

impl PoolConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_size: 100,
            completed_history_cap: 1000,
            failed_history_cap: 100,
            poll_interval_ms: 100,
        }
    }
}

/// Response cache sizing, TTL, and maintenance cadence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_size: usize,
    pub ttl_seconds: u64,
    /// Background cleanup cadence.
    pub cleanup_interval_seconds: u64,
    /// Entries unaccessed for this long with at most one hit are removed
    /// during optimization.
    pub stale_after_seconds: u64,
    /// Utilization above which the maintenance loop also optimizes.
    pub optimize_utilization: f64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            ttl_seconds: 3600,
            cleanup_interval_seconds: 300,
            stale_after_seconds: 3600,
            optimize_utilization: 0.9,
        }
    }
}
