//! Per-role quota tiers.

use super::role::Role;
use crate::modules::rate_limiting::Quota;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quota tier for one role: ceiling, window, and the message returned
/// when the ceiling is hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTier {
    /// Maximum requests per window.
    pub max_requests: u64,

    /// Window length.
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Limit-exceeded message surfaced to the caller.
    pub message: String,
}

impl QuotaTier {
    /// Create a tier.
    #[must_use]
    pub fn new(max_requests: u64, window: Duration, message: impl Into<String>) -> Self {
        Self {
            max_requests,
            window,
            message: message.into(),
        }
    }

    /// The tier's quota, as the counter store understands it.
    #[must_use]
    pub fn quota(&self) -> Quota {
        Quota::new(self.max_requests, self.window)
    }

    /// Validate the tier.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }
        if self.window.is_zero() {
            return Err("window must be greater than 0".to_string());
        }
        if self.message.is_empty() {
            return Err("message must not be empty".to_string());
        }
        Ok(())
    }
}

/// The tier table. One field per role, so the mapping is total by
/// construction and a missing tier cannot exist at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    /// Tier for unauthenticated callers.
    #[serde(default = "default_guest_tier")]
    pub guest: QuotaTier,

    /// Tier for students.
    #[serde(default = "default_student_tier")]
    pub student: QuotaTier,

    /// Tier for teachers.
    #[serde(default = "default_teacher_tier")]
    pub teacher: QuotaTier,

    /// Tier for administrators.
    #[serde(default = "default_admin_tier")]
    pub admin: QuotaTier,
}

fn default_guest_tier() -> QuotaTier {
    QuotaTier::new(
        5,
        Duration::from_secs(60),
        "Guest request limit exceeded (5 per minute). Please sign up for higher limits",
    )
}

fn default_student_tier() -> QuotaTier {
    QuotaTier::new(
        10,
        Duration::from_secs(60),
        "User request limit exceeded (10 per minute). Please Wait.",
    )
}

fn default_teacher_tier() -> QuotaTier {
    QuotaTier::new(
        10,
        Duration::from_secs(60),
        "User request limit exceeded (10 per minute). Please Wait.",
    )
}

fn default_admin_tier() -> QuotaTier {
    QuotaTier::new(
        20,
        Duration::from_secs(60),
        "Admin request limit exceeded (20 per minute). Slow Down.",
    )
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            guest: default_guest_tier(),
            student: default_student_tier(),
            teacher: default_teacher_tier(),
            admin: default_admin_tier(),
        }
    }
}

impl TierTable {
    /// Validate every tier.
    pub fn validate(&self) -> Result<(), String> {
        self.guest.validate().map_err(|e| format!("guest: {e}"))?;
        self.student
            .validate()
            .map_err(|e| format!("student: {e}"))?;
        self.teacher
            .validate()
            .map_err(|e| format!("teacher: {e}"))?;
        self.admin.validate().map_err(|e| format!("admin: {e}"))?;
        Ok(())
    }
}

/// Read-only lookup from role to tier, loaded once at startup.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    tiers: TierTable,
}

impl QuotaPolicy {
    /// Create a policy over a tier table.
    #[must_use]
    pub fn new(tiers: TierTable) -> Self {
        Self { tiers }
    }

    /// The tier for a role. Total: every role has one.
    #[must_use]
    pub fn tier_for(&self, role: Role) -> &QuotaTier {
        match role {
            Role::Guest => &self.tiers.guest,
            Role::Student => &self.tiers.student,
            Role::Teacher => &self.tiers.teacher,
            Role::Admin => &self.tiers.admin,
        }
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(TierTable::default())
    }
}
