//! Webhook server configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path the audit webhook is delivered to.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Pre-shared value expected in the `Authorization` header.
    /// Prefer setting it through `shared_secret_env`.
    #[serde(default, skip_serializing)]
    pub shared_secret: Option<String>,

    /// Environment variable that overrides `shared_secret`.
    #[serde(default = "default_shared_secret_env")]
    pub shared_secret_env: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_shared_secret_env() -> String {
    "GRANTWATCH_WEBHOOK_SECRET".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            webhook_path: default_webhook_path(),
            shared_secret: None,
            shared_secret_env: default_shared_secret_env(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.webhook_path.starts_with('/') {
            return Err(ConfigError::Config(format!(
                "server.webhook_path must start with '/': {}",
                self.webhook_path
            )));
        }
        match self.shared_secret.as_deref() {
            Some(s) if !s.is_empty() => Ok(()),
            _ => Err(ConfigError::Missing("server.shared_secret")),
        }
    }
}
