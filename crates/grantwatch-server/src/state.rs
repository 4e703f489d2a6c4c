use crate::grants_client::ConnectGrantsClient;
use grantwatch_core::GrantwatchConfig;
use grantwatch_policy::{AlertPipeline, GrantStatusResolver, GrantsClient};
use std::sync::Arc;

/// Shared application state.
///
/// Nothing in here is mutated per event; handlers only read it.
pub struct AppState {
    pub pipeline: AlertPipeline<Arc<dyn GrantsClient>>,
    pub shared_secret: String,
}

impl AppState {
    /// Build state around an existing grants client.
    pub fn new(cfg: &GrantwatchConfig, grants: Arc<dyn GrantsClient>) -> anyhow::Result<Self> {
        let shared_secret = cfg
            .server
            .shared_secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("server.shared_secret is not configured"))?;

        let resolver = GrantStatusResolver::new(grants, cfg.grants.timeout());
        Ok(Self {
            pipeline: AlertPipeline::new(cfg.watch.clone(), resolver),
            shared_secret,
        })
    }

    /// Build state with the Common Fate grants client.
    pub fn init(cfg: &GrantwatchConfig) -> anyhow::Result<Self> {
        let grants = ConnectGrantsClient::new(&cfg.grants)?;
        Self::new(cfg, Arc::new(grants))
    }
}
