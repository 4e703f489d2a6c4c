//! Configuration types for Grantwatch.
//!
//! Configuration is loaded from a single TOML file and then overlaid with the
//! environment variables used by existing Common Fate webhook deployments.
//!
//! # Sections
//!
//! - **watch**: the permission set to alert on and the base URL for review links
//! - **server**: bind address, webhook path and shared secret
//! - **grants**: grants service endpoint and OIDC client credentials
//! - **logging**: log filter and output format

pub mod grants;
pub mod logging;
pub mod server;
pub mod watch;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use grants::GrantsConfig;
pub use logging::LoggingConfig;
pub use server::ServerConfig;
pub use watch::WatchConfig;

/// Environment variable holding the grants service API URL.
pub const ENV_API_URL: &str = "CF_API_URL";
/// Environment variable holding the OIDC issuer.
pub const ENV_OIDC_ISSUER: &str = "CF_OIDC_ISSUER";
/// Environment variable holding the OIDC client ID.
pub const ENV_OIDC_CLIENT_ID: &str = "CF_OIDC_CLIENT_ID";
/// Environment variable holding the OIDC client secret.
pub const ENV_OIDC_CLIENT_SECRET: &str = "CF_OIDC_CLIENT_SECRET";

/// Complete Grantwatch configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantwatchConfig {
    /// What to watch for.
    #[serde(default)]
    pub watch: WatchConfig,

    /// Webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Grants service connection.
    #[serde(default)]
    pub grants: GrantsConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GrantwatchConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load a file, overlay the process environment and validate the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the environment.
    ///
    /// `lookup` resolves a variable name to its value. Empty values are
    /// treated as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_API_URL) {
            self.grants.api_url = v;
        }
        if let Some(v) = get(ENV_OIDC_ISSUER) {
            self.grants.oidc_issuer = v;
        }
        if let Some(v) = get(ENV_OIDC_CLIENT_ID) {
            self.grants.client_id = v;
        }
        if let Some(v) = get(ENV_OIDC_CLIENT_SECRET) {
            self.grants.client_secret = Some(v);
        }
        if let Some(v) = get(&self.server.shared_secret_env) {
            self.server.shared_secret = Some(v);
        }
    }

    /// Check that every section is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watch.validate()?;
        self.server.validate()?;
        self.grants.validate()?;
        Ok(())
    }
}

/// Parse `value` as an absolute URL, naming `field` in the error.
pub(crate) fn parse_url(field: &'static str, value: &str) -> Result<url::Url, ConfigError> {
    url::Url::parse(value).map_err(|source| ConfigError::InvalidUrl { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const FULL: &str = r#"
        [watch]
        permission_set_id = "ps-0123456789abcdef"
        access_url = "https://commonfate.example.com"

        [server]
        bind = "127.0.0.1:9000"
        shared_secret = "s3cret"

        [grants]
        api_url = "https://api.commonfate.example.com"
        oidc_issuer = "https://auth.commonfate.example.com"
        client_id = "client"
        client_secret = "secret"
        timeout_secs = 5
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = GrantwatchConfig::from_toml(FULL).unwrap();
        assert_eq!(config.watch.permission_set_id, "ps-0123456789abcdef");
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.webhook_path, "/webhook");
        assert_eq!(config.grants.timeout_secs, 5);
        assert!(config.logging.json);
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_config_fails_validation() {
        let config = GrantwatchConfig::from_toml("").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("watch.permission_set_id")));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GrantwatchConfig::from_toml(FULL).unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://override.example.com"),
            (ENV_OIDC_CLIENT_SECRET, "from-env"),
            (ENV_OIDC_CLIENT_ID, "  "),
            ("GRANTWATCH_WEBHOOK_SECRET", "env-secret"),
        ]
        .into_iter()
        .collect();

        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.grants.api_url, "https://override.example.com");
        assert_eq!(config.grants.client_secret.as_deref(), Some("from-env"));
        // Blank values do not override
        assert_eq!(config.grants.client_id, "client");
        assert_eq!(config.server.shared_secret.as_deref(), Some("env-secret"));
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let err = GrantwatchConfig::from_toml("[watch\npermission_set_id = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
