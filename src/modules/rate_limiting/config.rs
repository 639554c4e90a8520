//! Configuration for the sliding-window counter store.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A rate quota: a request ceiling over a trailing time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    /// Maximum requests admitted per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,

    /// Length of the trailing window.
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,
}

fn default_max_requests() -> u64 {
    5
}

fn default_window() -> Duration {
    Duration::from_secs(60)
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window: default_window(),
        }
    }
}

impl Quota {
    /// Create a quota of `max_requests` per `window`.
    #[must_use]
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Validate the quota.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }
        if self.window.is_zero() {
            return Err("window must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for the sliding-window store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of independently locked shards keys are spread over.
    #[serde(default = "default_shards")]
    pub shards: usize,

    /// Keys idle longer than this are dropped on sweep.
    #[serde(default = "default_max_idle", with = "humantime_serde")]
    pub max_idle: Duration,
}

fn default_shards() -> usize {
    16
}

fn default_max_idle() -> Duration {
    Duration::from_secs(300)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shards: default_shards(),
            max_idle: default_max_idle(),
        }
    }
}

impl StoreConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.shards == 0 {
            return Err("shards must be greater than 0".to_string());
        }
        if self.max_idle.is_zero() {
            return Err("max_idle must be greater than 0".to_string());
        }
        Ok(())
    }
}
