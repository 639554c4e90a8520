//! Caller roles and role resolution.

use crate::http::Request;
use tracing::debug;

/// Caller role, resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Unauthenticated or unrecognized caller. Most restrictive tier.
    Guest,

    /// Authenticated student.
    Student,

    /// Authenticated teacher.
    Teacher,

    /// Administrator.
    Admin,
}

impl Role {
    /// Parse a role name, case-insensitive.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "guest" => Some(Self::Guest),
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Lowercase role name, used in rate-limit keys and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the caller role from the authenticated-identity header set by
/// the upstream auth layer.
///
/// Never fails: absent or unrecognized input degrades to [`Role::Guest`].
#[derive(Debug, Clone)]
pub struct RoleResolver {
    /// Header carrying the authenticated role.
    header: String,
}

impl RoleResolver {
    /// Create a resolver reading the given header.
    #[must_use]
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    /// Resolve the caller role for a request.
    #[must_use]
    pub fn resolve(&self, request: &Request) -> Role {
        match request.header(&self.header) {
            Some(raw) => Role::parse(raw).unwrap_or_else(|| {
                debug!(role = raw, "unrecognized role, degrading to guest");
                Role::Guest
            }),
            None => Role::Guest,
        }
    }
}
