//! # Admission Control Module
//!
//! Role-aware request admission: every inbound request is tagged with a
//! caller role, matched to that role's quota tier, evaluated by the abuse
//! oracle, and answered with a single allow/deny verdict.
//!
//! ## Flow
//!
//! 1. [`RoleResolver`] derives the caller role (default: guest)
//! 2. [`QuotaPolicy`] selects the role's tier
//! 3. [`AdmissionDecider`] queries the oracle and applies deny precedence
//!    (bot > shield > rate limit)
//! 4. [`DecisionResponder`] short-circuits denials into 403/429/500
//!    responses; allowed requests are forwarded unmodified
//!
//! [`AdmissionControl`] packages the flow as middleware.

mod config;
mod decider;
mod handler;
mod quota;
mod responder;
mod role;

pub use config::{AdmissionConfig, FailPolicy};
pub use decider::{AdmissionDecider, Decision, DecisionState, DenialReason, Verdict};
pub use handler::{AdmissionControl, AdmissionStats, StatsSnapshot};
pub use quota::{QuotaPolicy, QuotaTier, TierTable};
pub use responder::DecisionResponder;
pub use role::{Role, RoleResolver};
