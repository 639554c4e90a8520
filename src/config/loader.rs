//! Configuration loading from file and environment.

use super::error::{ConfigError, ConfigResult};
use super::schema::AppConfig;
use std::path::Path;
use tracing::info;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "AEGIS_CONFIG";

/// Environment variable carrying the oracle credential. Takes precedence
/// over the file so the key never has to live on disk.
pub const ORACLE_KEY_VAR: &str = "AEGIS_ORACLE_KEY";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "aegis-gateway.toml";

/// Loads and validates [`AppConfig`].
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Create a loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load from the path in `AEGIS_CONFIG` (default
    /// `aegis-gateway.toml`), falling back to defaults when the file does
    /// not exist. Environment overrides are applied either way.
    pub fn from_env(&self) -> ConfigResult<AppConfig> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        self.load_or_default(path)
    }

    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> ConfigResult<AppConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.load_str(&content)
    }

    /// Load configuration from a TOML string.
    pub fn load_str(&self, content: &str) -> ConfigResult<AppConfig> {
        let mut config: AppConfig = toml::from_str(content)?;
        apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or start from defaults when it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(&self, path: P) -> ConfigResult<AppConfig> {
        let path = path.as_ref();
        if path.exists() {
            info!(path = %path.display(), "loading configuration");
            self.load(path)
        } else {
            info!(path = %path.display(), "no configuration file, using defaults");
            let mut config = AppConfig::default();
            apply_env_overrides(&mut config);
            config.validate()?;
            Ok(config)
        }
    }
}

/// Fold environment variables into the configuration.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(key) = std::env::var(ORACLE_KEY_VAR) {
        if !key.is_empty() {
            config.oracle.api_key = Some(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
            [store]
            shards = 4
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().load(&path).unwrap();
        assert_eq!(config.store.shards, 4);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let result = ConfigLoader::new().load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new()
            .load_or_default(dir.path().join("absent.toml"))
            .unwrap();
        assert!(config.admission.enabled);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = ConfigLoader::new().load_str("admission = 3");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let result = ConfigLoader::new().load_str(
            r#"
            [oracle]
            backend = "remote"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
