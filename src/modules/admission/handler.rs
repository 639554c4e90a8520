//! Admission middleware tying decider, responder and stats together.

use super::config::AdmissionConfig;
use super::decider::{AdmissionDecider, Decision, DenialReason, Verdict};
use super::responder::DecisionResponder;
use crate::config::{AppConfig, ConfigError, ConfigResult};
use crate::http::{HttpResult, Middleware, MiddlewareAction, Request};
use crate::modules::oracle::{AbuseOracle, LocalOracle, OracleBackend, RemoteOracle};
use crate::modules::rate_limiting::SlidingWindowStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Counters for admission outcomes.
#[derive(Debug, Default)]
pub struct AdmissionStats {
    /// Requests checked.
    pub checked: AtomicU64,

    /// Requests forwarded downstream.
    pub allowed: AtomicU64,

    /// Denied as bot traffic.
    pub denied_bot: AtomicU64,

    /// Denied by shield rules.
    pub denied_shield: AtomicU64,

    /// Denied over quota.
    pub denied_rate_limited: AtomicU64,

    /// Oracle failures (either fail policy).
    pub oracle_failures: AtomicU64,
}

impl AdmissionStats {
    fn record(&self, decision: &Decision) {
        self.checked.fetch_add(1, Ordering::Relaxed);
        match &decision.verdict {
            Verdict::Allow => {
                self.allowed.fetch_add(1, Ordering::Relaxed);
            },
            Verdict::Deny(DenialReason::Bot) => {
                self.denied_bot.fetch_add(1, Ordering::Relaxed);
            },
            Verdict::Deny(DenialReason::Shield) => {
                self.denied_shield.fetch_add(1, Ordering::Relaxed);
            },
            Verdict::Deny(DenialReason::RateLimit { .. }) => {
                self.denied_rate_limited.fetch_add(1, Ordering::Relaxed);
            },
            Verdict::Error => {},
        }
        if decision.state == super::decider::DecisionState::OracleFailure {
            self.oracle_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of the counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checked: self.checked.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            denied_bot: self.denied_bot.load(Ordering::Relaxed),
            denied_shield: self.denied_shield.load(Ordering::Relaxed),
            denied_rate_limited: self.denied_rate_limited.load(Ordering::Relaxed),
            oracle_failures: self.oracle_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`AdmissionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests checked.
    pub checked: u64,
    /// Requests forwarded downstream.
    pub allowed: u64,
    /// Denied as bot traffic.
    pub denied_bot: u64,
    /// Denied by shield rules.
    pub denied_shield: u64,
    /// Denied over quota.
    pub denied_rate_limited: u64,
    /// Oracle failures.
    pub oracle_failures: u64,
}

/// The admission-control middleware.
pub struct AdmissionControl {
    /// Decision state machine.
    decider: AdmissionDecider,

    /// Verdict to response translation.
    responder: DecisionResponder,

    /// Outcome counters.
    stats: Arc<AdmissionStats>,

    /// Local window store, when the local oracle backend is in use.
    /// Exposed so the host can schedule periodic sweeps.
    store: Option<Arc<SlidingWindowStore>>,

    /// Whether checks run at all.
    enabled: bool,
}

impl std::fmt::Debug for AdmissionControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionControl")
            .field("decider", &self.decider)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl AdmissionControl {
    /// Create the middleware from admission configuration and an oracle.
    #[must_use]
    pub fn new(config: &AdmissionConfig, oracle: Arc<dyn AbuseOracle>) -> Self {
        Self {
            decider: AdmissionDecider::new(config, oracle),
            responder: DecisionResponder::new(),
            stats: Arc::new(AdmissionStats::default()),
            store: None,
            enabled: config.enabled,
        }
    }

    /// Assemble the middleware from full application configuration,
    /// building the configured oracle backend.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the remote backend is selected but
    /// misconfigured.
    pub fn from_config(config: &AppConfig) -> ConfigResult<Self> {
        let mut store = None;

        let oracle: Arc<dyn AbuseOracle> = match config.oracle.backend {
            OracleBackend::Local => {
                let window_store = Arc::new(SlidingWindowStore::new(config.store.clone()));
                store = Some(Arc::clone(&window_store));
                Arc::new(
                    LocalOracle::new(window_store)
                        .with_base_quota(config.oracle.base_quota.clone()),
                )
            },
            OracleBackend::Remote => Arc::new(
                RemoteOracle::from_config(&config.oracle)
                    .map_err(|e| ConfigError::ValidationError(e.to_string()))?,
            ),
        };

        info!(
            oracle = oracle.name(),
            fail_policy = ?config.admission.fail_policy,
            "admission control assembled"
        );

        let mut control = Self::new(&config.admission, oracle);
        control.store = store;
        Ok(control)
    }

    /// Run the admission check for one request.
    pub async fn check(&self, request: Request) -> HttpResult<MiddlewareAction> {
        if !self.enabled {
            return Ok(MiddlewareAction::Continue(request));
        }

        let decision = self.decider.decide(&request).await;
        self.stats.record(&decision);

        let tier = self.decider.policy().tier_for(decision.role);
        match self.responder.respond(&decision, tier)? {
            Some(response) => Ok(MiddlewareAction::Respond(response)),
            None => Ok(MiddlewareAction::Continue(request)),
        }
    }

    /// Outcome counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The local window store, when one backs the oracle.
    #[must_use]
    pub fn store(&self) -> Option<&Arc<SlidingWindowStore>> {
        self.store.as_ref()
    }
}

#[async_trait]
impl Middleware for AdmissionControl {
    fn name(&self) -> &str {
        "admission-control"
    }

    async fn before(&self, request: Request) -> HttpResult<MiddlewareAction> {
        self.check(request).await
    }
}
