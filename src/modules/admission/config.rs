//! Configuration for the admission layer.

use super::quota::TierTable;
use serde::{Deserialize, Serialize};

/// What to do when the oracle is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailPolicy {
    /// Admit traffic and log a warning. Denying everything on a
    /// dependency outage is the harsher availability trade-off.
    #[default]
    Open,

    /// Reject traffic with a 500 until the oracle recovers.
    Closed,
}

/// Admission layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Whether admission control is enabled at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Header carrying the authenticated role, set by the upstream auth
    /// layer.
    #[serde(default = "default_role_header")]
    pub role_header: String,

    /// Header consulted for the caller address when the transport-level
    /// address is unavailable.
    #[serde(default = "default_forwarded_header")]
    pub forwarded_header: String,

    /// Oracle-unavailable policy.
    #[serde(default)]
    pub fail_policy: FailPolicy,

    /// Per-role quota tiers.
    #[serde(default)]
    pub tiers: TierTable,
}

fn default_enabled() -> bool {
    true
}

fn default_role_header() -> String {
    "x-authenticated-role".to_string()
}

fn default_forwarded_header() -> String {
    "x-forwarded-for".to_string()
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            role_header: default_role_header(),
            forwarded_header: default_forwarded_header(),
            fail_policy: FailPolicy::default(),
            tiers: TierTable::default(),
        }
    }
}

impl AdmissionConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.role_header.is_empty() {
            return Err("role_header must not be empty".to_string());
        }
        if self.forwarded_header.is_empty() {
            return Err("forwarded_header must not be empty".to_string());
        }
        self.tiers.validate().map_err(|e| format!("tiers: {e}"))?;
        Ok(())
    }
}
