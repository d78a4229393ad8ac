//! Gateway credentials and connection settings.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::{PushError, Result};

/// Default gateway endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://sdk.open.api.igexin.com/apiex.htm";

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "GETUI";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Gateway configuration.
#[derive(Clone, Deserialize)]
pub struct GetuiConfig {
    /// Application key.
    pub app_key: String,
    /// Application id.
    pub app_id: String,
    /// Master secret used to sign `connect`.
    pub master_secret: String,
    /// Gateway endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GetuiConfig {
    /// Create a configuration with the default endpoint.
    pub fn new(
        app_key: impl Into<String>,
        app_id: impl Into<String>,
        master_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_id: app_id.into(),
            master_secret: master_secret.into(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Load from `GETUI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_prefixed(ENV_PREFIX)
    }

    /// Load from `{prefix}_*` environment variables.
    ///
    /// Reads `APP_KEY`, `APP_ID`, `MASTER_SECRET`, and optionally `ENDPOINT`
    /// and `TIMEOUT_SECS`.
    pub fn from_env_prefixed(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", prefix, name));
        let required = |name: &str| {
            var(name).filter(|v| !v.is_empty()).ok_or_else(|| {
                PushError::Config(format!("{}_{} is not set", prefix, name))
            })
        };

        let mut config = Self::new(
            required("APP_KEY")?,
            required("APP_ID")?,
            required("MASTER_SECRET")?,
        );

        if let Some(endpoint) = var("ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(timeout) = var("TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                PushError::Config(format!("{}_TIMEOUT_SECS is not a number: {}", prefix, timeout))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PushError::Config(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check required settings.
    pub fn validate(&self) -> Result<()> {
        if self.app_key.is_empty() || self.app_id.is_empty() || self.master_secret.is_empty() {
            return Err(PushError::Config(
                "app_key, app_id and master_secret are required".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(PushError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for GetuiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetuiConfig")
            .field("app_key", &self.app_key)
            .field("app_id", &self.app_id)
            .field("master_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
