//! HTTP adapter for the external abuse-detection service.

use super::assessment::{Assessment, RateSignal};
use super::config::OracleConfig;
use super::descriptor::RequestDescriptor;
use super::error::{OracleError, OracleResult};
use super::AbuseOracle;
use crate::modules::rate_limiting::Quota;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Evaluation request sent to the detection service.
#[derive(Debug, Serialize)]
struct EvaluatePayload<'a> {
    /// Normalized request under evaluation.
    request: &'a RequestDescriptor,

    /// Role-resolved quota to apply.
    quota: WireQuota,

    /// Deployment baseline quota layered under it.
    base_quota: WireQuota,

    /// Crawler categories exempt from bot denial.
    allow: &'a [String],
}

#[derive(Debug, Serialize)]
struct WireQuota {
    max_requests: u64,
    window_seconds: u64,
}

impl From<&Quota> for WireQuota {
    fn from(quota: &Quota) -> Self {
        Self {
            max_requests: quota.max_requests,
            window_seconds: quota.window.as_secs(),
        }
    }
}

/// Evaluation reply from the detection service.
#[derive(Debug, Deserialize)]
struct EvaluateReply {
    #[serde(default)]
    bot: bool,

    #[serde(default)]
    shield: bool,

    #[serde(default)]
    rate_limit: Option<WireRate>,
}

#[derive(Debug, Deserialize)]
struct WireRate {
    limited: bool,

    #[serde(default)]
    count: u64,

    #[serde(default)]
    limit: u64,

    #[serde(default)]
    reset_seconds: u64,
}

impl EvaluateReply {
    fn into_assessment(self) -> Assessment {
        Assessment {
            bot: self.bot,
            shield: self.shield,
            rate: self.rate_limit.map(|rate| RateSignal {
                limited: rate.limited,
                count: rate.count,
                limit: rate.limit,
                reset_in: Duration::from_secs(rate.reset_seconds),
            }),
        }
    }
}

/// Client for the external abuse-detection service.
///
/// One evaluation is one POST of the descriptor, the resolved quota, the
/// baseline quota and the crawler allowlist; the reply carries the three
/// orthogonal signals. Every call is bounded by the configured timeout.
pub struct RemoteOracle {
    /// Evaluation endpoint.
    endpoint: Uri,

    /// Service credential, sent as a bearer token.
    api_key: String,

    /// Per-call deadline.
    timeout: Duration,

    /// Crawler categories forwarded with every evaluation.
    allow_categories: Vec<String>,

    /// Baseline quota forwarded with every evaluation.
    base_quota: Quota,

    /// Shared HTTP client.
    client: Client<HttpConnector, Full<Bytes>>,
}

impl std::fmt::Debug for RemoteOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteOracle")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RemoteOracle {
    /// Build the adapter from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::MissingCredential`] without an API key and
    /// [`OracleError::InvalidEndpoint`] when the endpoint does not parse.
    pub fn from_config(config: &OracleConfig) -> OracleResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(OracleError::MissingCredential)?;

        let raw_endpoint = config.endpoint.clone().unwrap_or_default();
        let endpoint = Uri::from_str(&raw_endpoint)
            .map_err(|_| OracleError::InvalidEndpoint(raw_endpoint.clone()))?;
        if endpoint.host().is_none() {
            return Err(OracleError::InvalidEndpoint(raw_endpoint));
        }

        Ok(Self {
            endpoint,
            api_key,
            timeout: config.timeout,
            allow_categories: config.allow_categories.clone(),
            base_quota: config.base_quota.clone(),
            client: Client::builder(TokioExecutor::new()).build_http(),
        })
    }
}

#[async_trait]
impl AbuseOracle for RemoteOracle {
    fn name(&self) -> &str {
        "remote"
    }

    async fn evaluate(
        &self,
        request: &RequestDescriptor,
        quota: &Quota,
    ) -> OracleResult<Assessment> {
        let payload = EvaluatePayload {
            request,
            quota: WireQuota::from(quota),
            base_quota: WireQuota::from(&self.base_quota),
            allow: &self.allow_categories,
        };
        let body =
            serde_json::to_vec(&payload).map_err(|e| OracleError::InvalidPayload(e.to_string()))?;

        let http_request = http::Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(http_request))
            .await
            .map_err(|_| OracleError::Timeout(self.timeout))?
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?
            .to_bytes();

        let reply: EvaluateReply = serde_json::from_slice(&bytes)
            .map_err(|e| OracleError::InvalidPayload(e.to_string()))?;

        Ok(reply.into_assessment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::oracle::OracleBackend;

    fn remote_config() -> OracleConfig {
        OracleConfig {
            backend: OracleBackend::Remote,
            endpoint: Some("http://oracle.internal/v1/evaluate".to_string()),
            api_key: Some("ajkey_test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config() {
        let oracle = RemoteOracle::from_config(&remote_config()).unwrap();
        assert_eq!(oracle.name(), "remote");
        assert_eq!(oracle.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_missing_credential_rejected() {
        let config = OracleConfig {
            api_key: None,
            ..remote_config()
        };
        assert!(matches!(
            RemoteOracle::from_config(&config),
            Err(OracleError::MissingCredential)
        ));
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let config = OracleConfig {
            endpoint: Some("not a uri".to_string()),
            ..remote_config()
        };
        assert!(matches!(
            RemoteOracle::from_config(&config),
            Err(OracleError::InvalidEndpoint(_))
        ));

        let config = OracleConfig {
            endpoint: Some("/relative/path".to_string()),
            ..remote_config()
        };
        assert!(matches!(
            RemoteOracle::from_config(&config),
            Err(OracleError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_reply_deserialization() {
        let reply: EvaluateReply = serde_json::from_str(
            r#"{"bot": false, "shield": true,
                "rate_limit": {"limited": false, "count": 3, "limit": 10, "reset_seconds": 42}}"#,
        )
        .unwrap();
        let assessment = reply.into_assessment();

        assert!(!assessment.bot);
        assert!(assessment.shield);
        let rate = assessment.rate.unwrap();
        assert!(!rate.limited);
        assert_eq!(rate.count, 3);
        assert_eq!(rate.reset_in, Duration::from_secs(42));
    }

    #[test]
    fn test_reply_defaults_for_sparse_payload() {
        let reply: EvaluateReply = serde_json::from_str(r#"{"bot": true}"#).unwrap();
        let assessment = reply.into_assessment();
        assert!(assessment.bot);
        assert!(!assessment.shield);
        assert!(assessment.rate.is_none());
    }

    #[test]
    fn test_payload_shape() {
        let descriptor = RequestDescriptor::new()
            .with_method("GET")
            .with_path("/api/subjects")
            .with_client_addr("198.51.100.7");
        let quota = Quota::new(10, Duration::from_secs(60));
        let allow = vec!["CATEGORY:SEARCH_ENGINE".to_string()];
        let payload = EvaluatePayload {
            request: &descriptor,
            quota: WireQuota::from(&quota),
            base_quota: WireQuota::from(&Quota::new(5, Duration::from_secs(2))),
            allow: &allow,
        };

        let json: serde_json::Value =
            serde_json::from_slice(&serde_json::to_vec(&payload).unwrap()).unwrap();
        assert_eq!(json["quota"]["max_requests"], 10);
        assert_eq!(json["quota"]["window_seconds"], 60);
        assert_eq!(json["base_quota"]["window_seconds"], 2);
        assert_eq!(json["request"]["path"], "/api/subjects");
        assert_eq!(json["allow"][0], "CATEGORY:SEARCH_ENGINE");
    }
}
