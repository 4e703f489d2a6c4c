//! Alerting target configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, parse_url};

/// What the decision pipeline watches for.
///
/// Passed to the pipeline by value at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Identity Center permission set ID to alert on.
    #[serde(default)]
    pub permission_set_id: String,

    /// Base URL of the Common Fate web app, used for access request links.
    #[serde(default)]
    pub access_url: String,
}

impl WatchConfig {
    pub fn new(permission_set_id: impl Into<String>, access_url: impl Into<String>) -> Self {
        Self {
            permission_set_id: permission_set_id.into(),
            access_url: access_url.into(),
        }
    }

    /// Build the deep link for an access request.
    ///
    /// Format: `<access_url>/access/requests/<id>`
    pub fn access_request_url(&self, access_request_id: &str) -> String {
        format!(
            "{}/access/requests/{}",
            self.access_url.trim_end_matches('/'),
            access_request_id
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.permission_set_id.trim().is_empty() {
            return Err(ConfigError::Missing("watch.permission_set_id"));
        }
        if self.access_url.trim().is_empty() {
            return Err(ConfigError::Missing("watch.access_url"));
        }
        parse_url("watch.access_url", &self.access_url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_request_url() {
        let watch = WatchConfig::new("ps-1", "https://commonfate.example.com");
        assert_eq!(
            watch.access_request_url("req_123"),
            "https://commonfate.example.com/access/requests/req_123"
        );
    }

    #[test]
    fn test_access_request_url_trailing_slash() {
        let watch = WatchConfig::new("ps-1", "https://commonfate.example.com/");
        assert_eq!(
            watch.access_request_url("r1"),
            "https://commonfate.example.com/access/requests/r1"
        );
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        let watch = WatchConfig::new("ps-1", "commonfate.example.com");
        assert!(matches!(
            watch.validate(),
            Err(ConfigError::InvalidUrl { field: "watch.access_url", .. })
        ));
    }
}
