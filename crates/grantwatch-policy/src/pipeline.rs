//! End-to-end evaluation of a single audit event.
//!
//! decode -> match targets -> (grant status lookup) -> decision

use grantwatch_audit::{AuditLog, decode};
use grantwatch_core::WatchConfig;

use crate::decision::{AlertDecision, Verdict, decide};
use crate::error::AlertError;
use crate::grants::{GrantStatusResolver, GrantsClient};
use crate::matcher::match_targets;

/// Decides whether audit events warrant an alert.
///
/// Holds no per-event state, so a shared reference can evaluate any number of
/// events concurrently.
pub struct AlertPipeline<C> {
    watch: WatchConfig,
    resolver: GrantStatusResolver<C>,
}

impl<C: GrantsClient> AlertPipeline<C> {
    pub fn new(watch: WatchConfig, resolver: GrantStatusResolver<C>) -> Self {
        Self { watch, resolver }
    }

    pub fn watch(&self) -> &WatchConfig {
        &self.watch
    }

    /// Decode `payload` and evaluate it.
    pub async fn process(&self, payload: &[u8]) -> Result<AlertDecision, AlertError> {
        let log = decode(payload)?;
        self.evaluate(&log).await
    }

    /// Evaluate an already decoded event.
    pub async fn evaluate(&self, log: &AuditLog) -> Result<AlertDecision, AlertError> {
        tracing::info!(
            event_id = %log.id,
            action = %log.action,
            occurred_at = %log.occurred_at,
            actor_id = %log.actor.id,
            actor_type = %log.actor.entity_type,
            targets = ?log.targets,
            message = %log.message,
            "Audit log event received"
        );

        let matched = match_targets(&log.targets, &self.watch.permission_set_id);
        if matched.is_ambiguous() {
            tracing::warn!(
                event_id = %log.id,
                grant_targets = matched.grant_count,
                access_request_targets = matched.access_request_count,
                "Event references more than one grant or access request; using the last of each"
            );
        }

        match decide(&log.action, &matched)? {
            Verdict::Decided(decision) => Ok(decision),
            Verdict::NeedsGrantStatus(lookup) => {
                let status = self.resolver.resolve(&lookup.grant_id).await?;
                Ok(lookup.conclude(&status, &self.watch))
            }
        }
    }
}
