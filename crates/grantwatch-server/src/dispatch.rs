//! Alert dispatch.
//!
//! Decisions are reported as structured log lines; the log pipeline routes
//! them to paging or SIEM tooling.

use grantwatch_core::WatchConfig;
use grantwatch_policy::AlertDecision;

pub fn dispatch(decision: &AlertDecision, watch: &WatchConfig) {
    match decision {
        AlertDecision::NoAlert => {
            tracing::debug!("No alert raised");
        }
        AlertDecision::PendingReview(alert) => {
            tracing::info!(
                grant_id = %alert.grant_id,
                access_request_id = %alert.access_request_id,
                access_request_url = %alert.url,
                permission_set_id = %watch.permission_set_id,
                "access request is pending and requires a manual review"
            );
        }
        AlertDecision::Breakglass => {
            tracing::warn!(
                permission_set_id = %watch.permission_set_id,
                "grant activated for watched permission set"
            );
        }
    }
}
