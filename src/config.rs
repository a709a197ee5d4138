//! Worker configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_LEASE: Duration = Duration::from_secs(60);

pub const ENV_POLL_INTERVAL_MS: &str = "LEADERBOARD_POLL_INTERVAL_MS";
pub const ENV_BATCH_SIZE: &str = "LEADERBOARD_BATCH_SIZE";
pub const ENV_CLEANUP_INTERVAL_SECS: &str = "LEADERBOARD_CLEANUP_INTERVAL_SECS";
pub const ENV_RETENTION_SECS: &str = "LEADERBOARD_RETENTION_SECS";
pub const ENV_LEASE_SECS: &str = "LEADERBOARD_LEASE_SECS";
pub const ENV_FAILURE_POLICY: &str = "LEADERBOARD_FAILURE_POLICY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// What the worker does with events whose refresh failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Mark the events processed anyway; the next event for the same target
    /// or a cold-cache rebuild repairs the entry.
    #[default]
    MarkProcessed,
    /// Leave the events unprocessed so a later tick claims them again.
    Retry,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::MarkProcessed => "mark_processed",
            FailurePolicy::Retry => "retry",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mark_processed" => Ok(FailurePolicy::MarkProcessed),
            "retry" => Ok(FailurePolicy::Retry),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

/// Knobs for `OutboxWorker` and `OutboxWorkerThread`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub cleanup_interval: Duration,
    pub retention: Duration,
    pub lease: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            retention: DEFAULT_RETENTION,
            lease: DEFAULT_LEASE,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl WorkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`. Unset keys keep their
    /// defaults; set keys must parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse::<u64, _>(&lookup, ENV_POLL_INTERVAL_MS)? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(size) = parse::<usize, _>(&lookup, ENV_BATCH_SIZE)? {
            if size == 0 {
                return Err(ConfigError::Invalid {
                    key: ENV_BATCH_SIZE,
                    value: size.to_string(),
                    reason: "batch size must be positive".to_string(),
                });
            }
            config.batch_size = size;
        }
        if let Some(secs) = parse::<u64, _>(&lookup, ENV_CLEANUP_INTERVAL_SECS)? {
            config.cleanup_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64, _>(&lookup, ENV_RETENTION_SECS)? {
            config.retention = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64, _>(&lookup, ENV_LEASE_SECS)? {
            config.lease = Duration::from_secs(secs);
        }
        if let Some(policy) = parse::<FailurePolicy, _>(&lookup, ENV_FAILURE_POLICY)? {
            config.failure_policy = policy;
        }

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        info!(key, "not set, using default");
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: err.to_string(),
        })
}
