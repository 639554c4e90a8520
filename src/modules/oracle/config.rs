//! Configuration for the abuse-oracle integration.

use crate::modules::rate_limiting::Quota;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which oracle implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    /// In-process quota-only oracle; bot/shield signals never raised.
    #[default]
    Local,

    /// External abuse-detection service over HTTP.
    Remote,
}

/// Oracle integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: OracleBackend,

    /// Remote service endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Remote service credential. Usually injected from the environment
    /// rather than written into the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Upper bound on one evaluation round-trip; exceeding it is treated
    /// as oracle failure.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Crawler categories exempt from bot denial (search engines, link
    /// previews). Forwarded to the oracle verbatim.
    #[serde(default = "default_allow_categories")]
    pub allow_categories: Vec<String>,

    /// Deployment-wide baseline quota layered under the role tiers.
    #[serde(default = "default_base_quota")]
    pub base_quota: Quota,
}

fn default_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_allow_categories() -> Vec<String> {
    vec![
        "CATEGORY:SEARCH_ENGINE".to_string(),
        "CATEGORY:PREVIEW".to_string(),
    ]
}

fn default_base_quota() -> Quota {
    Quota::new(5, Duration::from_secs(2))
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::Local,
            endpoint: None,
            api_key: None,
            timeout: default_timeout(),
            allow_categories: default_allow_categories(),
            base_quota: default_base_quota(),
        }
    }
}

impl OracleConfig {
    /// Validate the configuration.
    ///
    /// The remote backend needs both an endpoint and a credential; running
    /// without either is a deployment mistake, not something to discover
    /// per request.
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == OracleBackend::Remote {
            match self.endpoint.as_deref() {
                None | Some("") => {
                    return Err("oracle.endpoint is required for the remote backend".to_string())
                },
                Some(_) => {},
            }
            if self.api_key.as_deref().map_or(true, str::is_empty) {
                return Err("oracle.api_key is required for the remote backend".to_string());
            }
        }

        if self.timeout.is_zero() {
            return Err("oracle.timeout must be greater than 0".to_string());
        }

        self.base_quota
            .validate()
            .map_err(|e| format!("oracle.base_quota: {e}"))?;

        Ok(())
    }
}
