//! Grants service connection configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ConfigError, parse_url};

/// Connection settings for the Common Fate grants API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantsConfig {
    /// Base URL of the Common Fate API.
    #[serde(default)]
    pub api_url: String,

    /// OIDC issuer used for the client-credentials flow.
    #[serde(default)]
    pub oidc_issuer: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,

    /// Upper bound on a single grant lookup, including token acquisition.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for GrantsConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            oidc_issuer: String::new(),
            client_id: String::new(),
            client_secret: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GrantsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::Missing("grants.api_url"));
        }
        parse_url("grants.api_url", &self.api_url)?;
        if self.oidc_issuer.is_empty() {
            return Err(ConfigError::Missing("grants.oidc_issuer"));
        }
        parse_url("grants.oidc_issuer", &self.oidc_issuer)?;
        if self.client_id.is_empty() {
            return Err(ConfigError::Missing("grants.client_id"));
        }
        if self.client_secret.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Missing("grants.client_secret"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Config(
                "grants.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
