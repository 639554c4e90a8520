//! # Abuse Oracle Module
//!
//! Integration with the external abuse-detection service.
//!
//! The admission layer hands the oracle a normalized request descriptor
//! and the role-resolved quota; the oracle answers with three orthogonal
//! signals (bot, shield, rate limit). The oracle is an opaque decision
//! source behind the [`AbuseOracle`] trait so tests substitute a stub and
//! deployments choose a backend:
//!
//! - [`RemoteOracle`] — HTTP adapter to the detection service
//! - [`LocalOracle`] — in-process quota-only evaluation over the
//!   sliding-window store

mod assessment;
mod config;
mod descriptor;
mod error;
mod local;
mod remote;

pub use assessment::{Assessment, RateSignal};
pub use config::{OracleBackend, OracleConfig};
pub use descriptor::RequestDescriptor;
pub use error::{OracleError, OracleResult};
pub use local::LocalOracle;
pub use remote::RemoteOracle;

use crate::modules::rate_limiting::Quota;
use async_trait::async_trait;

/// The one capability the admission layer consumes: evaluate a request
/// against a quota and report what, if anything, would deny it.
#[async_trait]
pub trait AbuseOracle: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Evaluate one request.
    ///
    /// # Errors
    ///
    /// Any error means the oracle was unavailable or unintelligible; the
    /// caller applies its fail-open/fail-closed policy.
    async fn evaluate(&self, request: &RequestDescriptor, quota: &Quota)
        -> OracleResult<Assessment>;
}
