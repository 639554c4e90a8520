//! In-process quota-only oracle.

use super::assessment::{Assessment, RateSignal};
use super::descriptor::RequestDescriptor;
use super::error::OracleResult;
use super::AbuseOracle;
use crate::modules::rate_limiting::{Quota, SlidingWindowStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Oracle that applies the supplied quota through the local
/// sliding-window store and nothing else.
///
/// Bot and shield classification belong to the external detection
/// service; this backend never raises those signals. The optional base
/// quota is the deployment-wide baseline layered under the role tiers,
/// keyed by client identity alone so every role of one caller shares it.
pub struct LocalOracle {
    /// Shared window store.
    store: Arc<SlidingWindowStore>,

    /// Baseline quota under the role-specific one, if configured.
    base_quota: Option<Quota>,
}

impl std::fmt::Debug for LocalOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalOracle")
            .field("base_quota", &self.base_quota)
            .finish()
    }
}

impl LocalOracle {
    /// Create a local oracle over the given store.
    #[must_use]
    pub fn new(store: Arc<SlidingWindowStore>) -> Self {
        Self {
            store,
            base_quota: None,
        }
    }

    /// Layer a baseline quota under the supplied per-role quota.
    #[must_use]
    pub fn with_base_quota(mut self, quota: Quota) -> Self {
        self.base_quota = Some(quota);
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<SlidingWindowStore> {
        &self.store
    }
}

#[async_trait]
impl AbuseOracle for LocalOracle {
    fn name(&self) -> &str {
        "local"
    }

    async fn evaluate(
        &self,
        request: &RequestDescriptor,
        quota: &Quota,
    ) -> OracleResult<Assessment> {
        let key = match request.partition_key.as_deref() {
            Some(key) => key.to_string(),
            None => format!("addr:{}", request.client_identity()),
        };

        let decision = self.store.try_admit(&key, quota);
        let mut rate = RateSignal {
            limited: !decision.admitted,
            count: decision.count,
            limit: decision.limit,
            reset_in: decision.reset_in,
        };

        // The baseline only matters for requests the role quota admitted;
        // a denied request must not consume baseline slots.
        if decision.admitted {
            if let Some(ref base) = self.base_quota {
                let base_key = format!("base:{}", request.client_identity());
                let base_decision = self.store.try_admit(&base_key, base);
                if !base_decision.admitted {
                    rate = RateSignal {
                        limited: true,
                        count: base_decision.count,
                        limit: base_decision.limit,
                        reset_in: base_decision.reset_in,
                    };
                }
            }
        }

        Ok(Assessment::clean().with_rate(rate))
    }
}
