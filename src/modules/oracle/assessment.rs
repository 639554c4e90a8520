//! The oracle's composite answer for one request.

use std::time::Duration;

/// Rate-limit evaluation detail inside an assessment.
#[derive(Debug, Clone)]
pub struct RateSignal {
    /// Whether the quota was exhausted.
    pub limited: bool,

    /// Requests counted in the current window.
    pub count: u64,

    /// The ceiling that was applied.
    pub limit: u64,

    /// Time until the oldest counted request ages out.
    pub reset_in: Duration,
}

impl RateSignal {
    /// Retry-After value in whole seconds, never below 1.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        (self.reset_in.as_secs_f64().ceil() as u64).max(1)
    }
}

/// Composite verdict material returned by the oracle.
///
/// The three signals are orthogonal; precedence among them is the
/// admission decider's policy, not the oracle's.
#[derive(Debug, Clone, Default)]
pub struct Assessment {
    /// Request classified as automated (and not an allowlisted crawler).
    pub bot: bool,

    /// Request tripped a shield/WAF rule.
    pub shield: bool,

    /// Quota evaluation, when one was performed.
    pub rate: Option<RateSignal>,
}

impl Assessment {
    /// An assessment with no signals raised.
    #[must_use]
    pub fn clean() -> Self {
        Self::default()
    }

    /// Builder: mark as bot traffic.
    #[must_use]
    pub fn with_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// Builder: mark as shield-blocked.
    #[must_use]
    pub fn with_shield(mut self) -> Self {
        self.shield = true;
        self
    }

    /// Builder: attach a rate signal.
    #[must_use]
    pub fn with_rate(mut self, rate: RateSignal) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Whether any signal would deny the request.
    #[must_use]
    pub fn is_denying(&self) -> bool {
        self.bot || self.shield || self.rate.as_ref().is_some_and(|r| r.limited)
    }
}
