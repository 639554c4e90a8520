//! Process-wide configuration: schema, loading, validation.
//!
//! Configuration is read once at startup into an immutable [`AppConfig`]
//! and handed explicitly to the components that need it. Any
//! configuration error is fatal: the process refuses to start rather than
//! run with a partial admission policy.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH, ORACLE_KEY_VAR};
pub use schema::AppConfig;
