//! Verdict to transport-response translation.

use super::decider::{Decision, DenialReason, Verdict};
use super::quota::QuotaTier;
use crate::http::{HttpResult, Response};
use serde_json::json;
use tracing::debug;

/// Maps admission decisions onto HTTP responses.
///
/// Denials are expected business outcomes: they are logged at debug
/// level, never as errors.
#[derive(Debug, Default)]
pub struct DecisionResponder;

impl DecisionResponder {
    /// Create a responder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the short-circuit response for a decision, or `None` when
    /// the request should be forwarded downstream.
    ///
    /// `tier` is the quota tier the request was evaluated against; its
    /// message is surfaced on rate-limit denials.
    pub fn respond(&self, decision: &Decision, tier: &QuotaTier) -> HttpResult<Option<Response>> {
        let response = match &decision.verdict {
            Verdict::Allow => None,

            Verdict::Deny(reason @ DenialReason::Bot) => {
                self.log_denial(decision, reason);
                Some(
                    Response::forbidden()
                        .json(&json!({
                            "error": "Forbidden",
                            "message": "Automated requests are not allowed.",
                        }))?
                        .build(),
                )
            },

            Verdict::Deny(reason @ DenialReason::Shield) => {
                self.log_denial(decision, reason);
                Some(
                    Response::forbidden()
                        .json(&json!({
                            "error": "Forbidden",
                            "message": "Request blocked by security policy",
                        }))?
                        .build(),
                )
            },

            Verdict::Deny(reason @ DenialReason::RateLimit { .. }) => {
                self.log_denial(decision, reason);
                let retry_after = reason.retry_after_secs().unwrap_or(1);
                Some(
                    Response::too_many_requests()
                        .header("Retry-After", retry_after.to_string())
                        .json(&json!({
                            "error": "Too many requests",
                            "message": tier.message.clone(),
                        }))?
                        .build(),
                )
            },

            Verdict::Error => Some(
                Response::internal_error()
                    .json(&json!({
                        "error": "Internal Server Error",
                        "message": "Something went wrong with the admission check",
                    }))?
                    .build(),
            ),
        };

        Ok(response)
    }

    fn log_denial(&self, decision: &Decision, reason: &DenialReason) {
        debug!(
            correlation_id = %decision.correlation_id,
            role = %decision.role,
            reason = reason.as_str(),
            "request denied"
        );
    }
}
