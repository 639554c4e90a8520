//! Application configuration schema.

use super::error::{ConfigError, ConfigResult};
use crate::modules::admission::AdmissionConfig;
use crate::modules::oracle::OracleConfig;
use crate::modules::rate_limiting::StoreConfig;
use serde::{Deserialize, Serialize};

/// The full application configuration, loaded once at startup and
/// immutable afterwards. Passed explicitly into the components that need
/// it; nothing reads ambient global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Admission layer settings.
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Sliding-window store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Abuse oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,
}

impl AppConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending
    /// section and field. The process must not start on any of these.
    pub fn validate(&self) -> ConfigResult<()> {
        self.admission
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("admission: {e}")))?;
        self.store
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("store: {e}")))?;
        self.oracle
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("oracle: {e}")))?;
        Ok(())
    }
}
