//! Client configuration
//!
//! Layers, lowest precedence first: built-in defaults, an optional JSON or
//! TOML file, then `TOLLGATE__*` environment variables (nested keys use a
//! double underscore, e.g. `TOLLGATE__ENDPOINTS__TOKEN`).

use crate::{CoreError, CoreResult};
use ::config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// What to do with stored tokens when the server rejects a refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshFailurePolicy {
    /// Leave both tokens in storage so a later refresh can retry
    #[default]
    Retain,
    /// Clear both tokens and drop the in-memory session
    ClearTokens,
}

/// Paths of the token endpoints, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub token: String,
    pub refresh: String,
    pub register: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            token: "api/token/".to_string(),
            refresh: "api/token/refresh/".to_string(),
            register: "api/register/".to_string(),
        }
    }
}

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto
    pub base_url: String,

    /// Request timeout in seconds (0 disables the timeout)
    #[serde(default)]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub endpoints: EndpointConfig,

    #[serde(default)]
    pub refresh_failure: RefreshFailurePolicy,
}

fn default_user_agent() -> String {
    format!("tollgate/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            timeout_secs: 0,
            user_agent: default_user_agent(),
            endpoints: EndpointConfig::default(),
            refresh_failure: RefreshFailurePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration, reading `path` only if it exists
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        Self::finish(builder)
    }

    /// Load configuration from a file that must exist
    pub fn load_from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.as_ref()).required(true));

        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> CoreResult<Self> {
        let config: Self = builder
            .add_source(
                Environment::with_prefix("TOLLGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check that the base URL is an absolute http(s) URL
    pub fn validate(&self) -> CoreResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| CoreError::invalid_config(format!("base_url {:?}: {e}", self.base_url)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(CoreError::invalid_config(format!(
                "base_url must use http or https, got {other}"
            ))),
        }
    }

    /// Request timeout, if one is configured
    pub const fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000/");
        assert_eq!(config.endpoints.token, "api/token/");
        assert_eq!(config.endpoints.refresh, "api/token/refresh/");
        assert_eq!(config.endpoints.register, "api/register/");
        assert_eq!(config.refresh_failure, RefreshFailurePolicy::Retain);
        assert_eq!(config.timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ClientConfig::load(temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config.base_url, ClientConfig::default().base_url);
    }

    #[test]
    fn test_load_merges_file_over_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
base_url = "https://api.example.com/"
timeout_secs = 15
refresh_failure = "clear_tokens"

[endpoints]
token = "auth/jwt/create/"
refresh = "auth/jwt/refresh/"
register = "auth/users/"
"#,
        )
        .unwrap();

        let config = ClientConfig::load_from_file(&path).unwrap();
        assert_eq!(config.base_url, "https://api.example.com/");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.refresh_failure, RefreshFailurePolicy::ClearTokens);
        assert_eq!(config.endpoints.token, "auth/jwt/create/");
        assert_eq!(config.user_agent, default_user_agent());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config").join("config.json");

        let config = ClientConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..ClientConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(ClientConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = ClientConfig::load_from_file(temp_dir.path().join("absent.json"));
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let relative = ClientConfig {
            base_url: "api/".to_string(),
            ..ClientConfig::default()
        };
        assert!(relative.validate().is_err());

        let ftp = ClientConfig {
            base_url: "ftp://example.com/".to_string(),
            ..ClientConfig::default()
        };
        assert!(ftp.validate().is_err());
    }
}
