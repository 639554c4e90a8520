//! Admission decision state machine.

use super::config::{AdmissionConfig, FailPolicy};
use super::quota::QuotaPolicy;
use super::role::{Role, RoleResolver};
use crate::http::Request;
use crate::modules::oracle::{AbuseOracle, RequestDescriptor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, trace, warn};

/// Progress of one admission check.
///
/// Transitions are strictly sequential; the only branch is at `Decided`
/// (allow or one of the deny reasons) and the failure exit taken when the
/// oracle call errors or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionState {
    /// Request received.
    Start,

    /// Caller role derived.
    RoleResolved,

    /// Role's quota tier selected.
    QuotaSelected,

    /// Oracle answered.
    OracleQueried,

    /// Verdict produced.
    Decided,

    /// Oracle call failed; fail policy applied.
    OracleFailure,
}

impl DecisionState {
    /// State name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::RoleResolved => "role_resolved",
            Self::QuotaSelected => "quota_selected",
            Self::OracleQueried => "oracle_queried",
            Self::Decided => "decided",
            Self::OracleFailure => "oracle_failure",
        }
    }
}

/// Why a request was denied. Exactly one reason per denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// Automated traffic outside the crawler allowlist.
    Bot,

    /// Shield/WAF rule match.
    Shield,

    /// Role quota exhausted.
    RateLimit {
        /// Time until the oldest counted request ages out.
        retry_after: Duration,
    },
}

impl DenialReason {
    /// Reason label for logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::Shield => "shield",
            Self::RateLimit { .. } => "rate_limit",
        }
    }

    /// Retry-After in whole seconds (min 1) for rate-limit denials.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after } => {
                Some((retry_after.as_secs_f64().ceil() as u64).max(1))
            },
            _ => None,
        }
    }
}

/// Final verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Forward the request downstream unmodified.
    Allow,

    /// Reject with the given reason.
    Deny(DenialReason),

    /// Oracle failure under the fail-closed policy.
    Error,
}

/// The decision for one request: verdict plus the context the responder
/// and stats need.
#[derive(Debug, Clone)]
pub struct Decision {
    /// The verdict.
    pub verdict: Verdict,

    /// Role the request was evaluated as.
    pub role: Role,

    /// Correlation id from the request, or `"unknown"`.
    pub correlation_id: String,

    /// Terminal state of the admission check.
    pub state: DecisionState,
}

impl Decision {
    /// Whether the request proceeds downstream.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self.verdict, Verdict::Allow)
    }
}

/// Orchestrates role resolution, quota selection and the oracle query
/// into a single verdict per request.
///
/// Deny precedence is Bot > Shield > RateLimit: automated and malicious
/// traffic is rejected before it is allowed to consume quota bookkeeping.
/// The oracle is always queried before the verdict is formed; the quota
/// is evaluated inside it.
pub struct AdmissionDecider {
    /// Role resolution.
    resolver: RoleResolver,

    /// Role to tier lookup.
    policy: QuotaPolicy,

    /// The abuse oracle.
    oracle: Arc<dyn AbuseOracle>,

    /// What to do when the oracle is unavailable.
    fail_policy: FailPolicy,

    /// Forwarded-address header honored when the peer address is missing.
    forwarded_header: String,
}

impl std::fmt::Debug for AdmissionDecider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionDecider")
            .field("oracle", &self.oracle.name())
            .field("fail_policy", &self.fail_policy)
            .finish()
    }
}

impl AdmissionDecider {
    /// Create a decider from configuration and an oracle.
    #[must_use]
    pub fn new(config: &AdmissionConfig, oracle: Arc<dyn AbuseOracle>) -> Self {
        Self {
            resolver: RoleResolver::new(&config.role_header),
            policy: QuotaPolicy::new(config.tiers.clone()),
            oracle,
            fail_policy: config.fail_policy,
            forwarded_header: config.forwarded_header.to_lowercase(),
        }
    }

    /// The quota policy in effect.
    #[must_use]
    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Run the admission check for one request.
    pub async fn decide(&self, request: &Request) -> Decision {
        let correlation_id = correlation_id(request);
        let mut state = DecisionState::Start;
        trace!(
            correlation_id = %correlation_id,
            state = state.as_str(),
            "admission check started"
        );

        let role = self.resolver.resolve(request);
        state = DecisionState::RoleResolved;
        trace!(%role, state = state.as_str(), "role resolved");

        let tier = self.policy.tier_for(role);
        state = DecisionState::QuotaSelected;
        trace!(
            max = tier.max_requests,
            window = ?tier.window,
            state = state.as_str(),
            "quota selected"
        );

        let identity = self.client_identity(request, &correlation_id);
        let descriptor = self.descriptor_for(request, role, &identity);

        let verdict = match self.oracle.evaluate(&descriptor, &tier.quota()).await {
            Ok(assessment) => {
                state = DecisionState::OracleQueried;
                trace!(
                    bot = assessment.bot,
                    shield = assessment.shield,
                    state = state.as_str(),
                    "oracle answered"
                );

                let verdict = if assessment.bot {
                    Verdict::Deny(DenialReason::Bot)
                } else if assessment.shield {
                    Verdict::Deny(DenialReason::Shield)
                } else if let Some(rate) = assessment.rate.filter(|r| r.limited) {
                    Verdict::Deny(DenialReason::RateLimit {
                        retry_after: rate.reset_in,
                    })
                } else {
                    Verdict::Allow
                };

                state = DecisionState::Decided;
                verdict
            },
            Err(err) => {
                state = DecisionState::OracleFailure;
                match self.fail_policy {
                    FailPolicy::Open => {
                        warn!(
                            correlation_id = %correlation_id,
                            oracle = self.oracle.name(),
                            error = %err,
                            "abuse oracle unavailable, failing open"
                        );
                        Verdict::Allow
                    },
                    FailPolicy::Closed => {
                        error!(
                            correlation_id = %correlation_id,
                            oracle = self.oracle.name(),
                            error = %err,
                            "abuse oracle unavailable, failing closed"
                        );
                        Verdict::Error
                    },
                }
            },
        };

        Decision {
            verdict,
            role,
            correlation_id,
            state,
        }
    }

    /// Best-effort caller identity: peer address, then the forwarded
    /// header, then `"unknown"` with a logged warning.
    fn client_identity(&self, request: &Request, correlation_id: &str) -> String {
        if let Some(addr) = request.remote_addr() {
            return addr.to_string();
        }

        if let Some(forwarded) = request.header(&self.forwarded_header) {
            // First entry is the originating client.
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }

        warn!(
            correlation_id = %correlation_id,
            method = %request.method(),
            path = request.path(),
            user_agent = request.header("user-agent").unwrap_or("unknown"),
            "missing client identity, proceeding with best effort"
        );
        "unknown".to_string()
    }

    fn descriptor_for(&self, request: &Request, role: Role, identity: &str) -> RequestDescriptor {
        let mut descriptor = RequestDescriptor::new()
            .with_method(request.method().as_str())
            .with_path(request.path())
            .with_partition_key(format!("{role}:{identity}"));

        for (name, value) in request.headers() {
            descriptor = descriptor.with_header(name.clone(), value.clone());
        }

        if identity != "unknown" {
            descriptor = descriptor.with_client_addr(identity);
        }

        descriptor
    }
}

/// Correlation id from the request, or `"unknown"`.
fn correlation_id(request: &Request) -> String {
    request
        .header("x-request-id")
        .or_else(|| request.header("x-correlation-id"))
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::oracle::{Assessment, OracleError, OracleResult, RateSignal};
    use crate::modules::rate_limiting::Quota;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Oracle scripted to return a fixed answer, recording what it saw.
    struct ScriptedOracle {
        answer: OracleResult<Assessment>,
        seen: Mutex<Vec<RequestDescriptor>>,
    }

    impl ScriptedOracle {
        fn returning(answer: OracleResult<Assessment>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AbuseOracle for ScriptedOracle {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn evaluate(
            &self,
            request: &RequestDescriptor,
            _quota: &Quota,
        ) -> OracleResult<Assessment> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.answer {
                Ok(assessment) => Ok(assessment.clone()),
                Err(err) => Err(OracleError::Transport(err.to_string())),
            }
        }
    }

    fn decider_with(oracle: Arc<dyn AbuseOracle>, fail_policy: FailPolicy) -> AdmissionDecider {
        let config = AdmissionConfig {
            fail_policy,
            ..Default::default()
        };
        AdmissionDecider::new(&config, oracle)
    }

    fn request() -> Request {
        Request::builder()
            .uri("/api/subjects")
            .remote_addr("203.0.113.9")
            .header("x-request-id", "req-42")
            .build()
    }

    #[tokio::test]
    async fn test_clean_request_allowed() {
        let oracle = ScriptedOracle::returning(Ok(Assessment::clean()));
        let decider = decider_with(oracle.clone(), FailPolicy::Open);

        let decision = decider.decide(&request()).await;
        assert!(decision.is_allowed());
        assert_eq!(decision.state, DecisionState::Decided);
        assert_eq!(decision.correlation_id, "req-42");
    }

    #[tokio::test]
    async fn test_bot_takes_precedence_over_available_quota() {
        // Bot flagged AND quota available: bot must win.
        let assessment = Assessment::clean().with_bot().with_rate(RateSignal {
            limited: false,
            count: 1,
            limit: 5,
            reset_in: Duration::from_secs(10),
        });
        let oracle = ScriptedOracle::returning(Ok(assessment));
        let decider = decider_with(oracle, FailPolicy::Open);

        let decision = decider.decide(&request()).await;
        assert_eq!(decision.verdict, Verdict::Deny(DenialReason::Bot));
    }

    #[tokio::test]
    async fn test_bot_takes_precedence_over_shield_and_rate_limit() {
        let assessment = Assessment::clean()
            .with_bot()
            .with_shield()
            .with_rate(RateSignal {
                limited: true,
                count: 6,
                limit: 5,
                reset_in: Duration::from_secs(10),
            });
        let oracle = ScriptedOracle::returning(Ok(assessment));
        let decider = decider_with(oracle, FailPolicy::Open);

        let decision = decider.decide(&request()).await;
        assert_eq!(decision.verdict, Verdict::Deny(DenialReason::Bot));
    }

    #[tokio::test]
    async fn test_shield_beats_rate_limit() {
        let assessment = Assessment::clean().with_shield().with_rate(RateSignal {
            limited: true,
            count: 6,
            limit: 5,
            reset_in: Duration::from_secs(10),
        });
        let oracle = ScriptedOracle::returning(Ok(assessment));
        let decider = decider_with(oracle, FailPolicy::Open);

        let decision = decider.decide(&request()).await;
        assert_eq!(decision.verdict, Verdict::Deny(DenialReason::Shield));
    }

    #[tokio::test]
    async fn test_rate_limited_carries_retry_after() {
        let assessment = Assessment::clean().with_rate(RateSignal {
            limited: true,
            count: 6,
            limit: 5,
            reset_in: Duration::from_secs(33),
        });
        let oracle = ScriptedOracle::returning(Ok(assessment));
        let decider = decider_with(oracle, FailPolicy::Open);

        let decision = decider.decide(&request()).await;
        match &decision.verdict {
            Verdict::Deny(reason @ DenialReason::RateLimit { retry_after }) => {
                assert_eq!(*retry_after, Duration::from_secs(33));
                assert_eq!(reason.retry_after_secs(), Some(33));
            },
            other => panic!("expected rate-limit denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_oracle_failure_fails_open() {
        let oracle = ScriptedOracle::returning(Err(OracleError::Transport("down".to_string())));
        let decider = decider_with(oracle, FailPolicy::Open);

        let decision = decider.decide(&request()).await;
        assert_eq!(decision.verdict, Verdict::Allow);
        assert_eq!(decision.state, DecisionState::OracleFailure);
    }

    #[tokio::test]
    async fn test_oracle_failure_fails_closed() {
        let oracle = ScriptedOracle::returning(Err(OracleError::Transport("down".to_string())));
        let decider = decider_with(oracle, FailPolicy::Closed);

        let decision = decider.decide(&request()).await;
        assert_eq!(decision.verdict, Verdict::Error);
        assert_eq!(decision.state, DecisionState::OracleFailure);
    }

    #[tokio::test]
    async fn test_descriptor_carries_role_partition_key() {
        let oracle = ScriptedOracle::returning(Ok(Assessment::clean()));
        let decider = decider_with(oracle.clone(), FailPolicy::Open);

        let request = Request::builder()
            .uri("/api/subjects")
            .remote_addr("203.0.113.9")
            .header("x-authenticated-role", "admin")
            .build();
        decider.decide(&request).await;

        let seen = oracle.seen.lock().unwrap();
        assert_eq!(
            seen[0].partition_key.as_deref(),
            Some("admin:203.0.113.9")
        );
        assert_eq!(seen[0].client_addr.as_deref(), Some("203.0.113.9"));
    }

    #[tokio::test]
    async fn test_forwarded_header_fallback() {
        let oracle = ScriptedOracle::returning(Ok(Assessment::clean()));
        let decider = decider_with(oracle.clone(), FailPolicy::Open);

        let request = Request::builder()
            .uri("/api/subjects")
            .header("x-forwarded-for", "198.51.100.7, 10.0.0.1")
            .build();
        decider.decide(&request).await;

        let seen = oracle.seen.lock().unwrap();
        assert_eq!(
            seen[0].partition_key.as_deref(),
            Some("guest:198.51.100.7")
        );
    }

    #[tokio::test]
    async fn test_missing_identity_proceeds() {
        let oracle = ScriptedOracle::returning(Ok(Assessment::clean()));
        let decider = decider_with(oracle.clone(), FailPolicy::Open);

        let request = Request::builder().uri("/api/subjects").build();
        let decision = decider.decide(&request).await;

        assert!(decision.is_allowed());
        let seen = oracle.seen.lock().unwrap();
        assert_eq!(seen[0].partition_key.as_deref(), Some("guest:unknown"));
        assert!(seen[0].client_addr.is_none());
    }

    #[tokio::test]
    async fn test_correlation_id_fallbacks() {
        let oracle = ScriptedOracle::returning(Ok(Assessment::clean()));
        let decider = decider_with(oracle, FailPolicy::Open);

        let request = Request::builder()
            .uri("/x")
            .header("x-correlation-id", "corr-7")
            .build();
        let decision = decider.decide(&request).await;
        assert_eq!(decision.correlation_id, "corr-7");

        let decider = decider_with(
            ScriptedOracle::returning(Ok(Assessment::clean())),
            FailPolicy::Open,
        );
        let request = Request::builder().uri("/x").build();
        let decision = decider.decide(&request).await;
        assert_eq!(decision.correlation_id, "unknown");
    }
}
