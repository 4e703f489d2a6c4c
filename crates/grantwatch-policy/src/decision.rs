//! Alert decision table.
//!
//! | Action            | Permission set matched | Outcome                                   |
//! |-------------------|------------------------|-------------------------------------------|
//! | `grant.activated` | no                     | `NoAlert`                                 |
//! | `grant.activated` | yes                    | `Breakglass`                              |
//! | `grant.requested` | no                     | `NoAlert`                                 |
//! | `grant.requested` | yes                    | grant status lookup, `PendingReview` when pending |
//! | anything else     | -                      | `NoAlert`                                 |
//!
//! Each event is evaluated on its own; nothing is carried between events.

use grantwatch_audit::{Action, entity_types};
use grantwatch_core::WatchConfig;
use serde::Serialize;

use crate::error::AlertError;
use crate::grants::GrantStatus;
use crate::matcher::TargetMatch;

/// The outcome for a single event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AlertDecision {
    /// Nothing to report.
    NoAlert,
    /// A request for the watched permission set is waiting for manual review.
    PendingReview(PendingReviewAlert),
    /// Access to the watched permission set was activated.
    Breakglass,
}

impl AlertDecision {
    pub fn is_alert(&self) -> bool {
        !matches!(self, Self::NoAlert)
    }
}

/// Details of a pending access request that needs a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingReviewAlert {
    pub grant_id: String,
    pub access_request_id: String,
    /// Deep link to the access request.
    pub url: String,
}

/// Result of applying the decision table before any external lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The decision does not depend on grant status.
    Decided(AlertDecision),
    /// The decision depends on the status of the carried grant.
    NeedsGrantStatus(GrantLookup),
}

/// A grant whose status decides the alert.
///
/// The grant ID used for the lookup travels with the access request ID, so a
/// status can only ever be applied to the grant it was fetched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantLookup {
    pub grant_id: String,
    pub access_request_id: String,
}

impl GrantLookup {
    /// Finish the decision once the grant's status is known.
    pub fn conclude(self, status: &GrantStatus, watch: &WatchConfig) -> AlertDecision {
        if !status.is_pending() {
            return AlertDecision::NoAlert;
        }
        let url = watch.access_request_url(&self.access_request_id);
        AlertDecision::PendingReview(PendingReviewAlert {
            grant_id: self.grant_id,
            access_request_id: self.access_request_id,
            url,
        })
    }
}

/// Apply the decision table to an action and its target match.
pub fn decide(action: &Action, matched: &TargetMatch) -> Result<Verdict, AlertError> {
    match action {
        Action::GrantActivated if matched.matches_permission_set => {
            Ok(Verdict::Decided(AlertDecision::Breakglass))
        }
        Action::GrantRequested if matched.matches_permission_set => {
            let grant_id = matched
                .grant_id
                .clone()
                .ok_or(AlertError::MissingRequiredTarget {
                    target_type: entity_types::GRANT,
                })?;
            let access_request_id = matched.access_request_id.clone().ok_or(
                AlertError::MissingRequiredTarget {
                    target_type: entity_types::REQUEST,
                },
            )?;
            Ok(Verdict::NeedsGrantStatus(GrantLookup {
                grant_id,
                access_request_id,
            }))
        }
        _ => Ok(Verdict::Decided(AlertDecision::NoAlert)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn matched(grant: Option<&str>, request: Option<&str>) -> TargetMatch {
        TargetMatch {
            matches_permission_set: true,
            grant_id: grant.map(String::from),
            access_request_id: request.map(String::from),
            grant_count: grant.iter().count(),
            access_request_count: request.iter().count(),
        }
    }

    #[test]
    fn test_irrelevant_actions_never_alert() {
        let m = matched(Some("gra_1"), Some("req_1"));
        for action in Action::KNOWN
            .into_iter()
            .filter(|a| !matches!(a, Action::GrantRequested | Action::GrantActivated))
            .chain([Action::from("grant.something_new")])
        {
            assert_eq!(
                decide(&action, &m).unwrap(),
                Verdict::Decided(AlertDecision::NoAlert),
                "{action}"
            );
        }
    }

    #[test]
    fn test_activated_on_watched_permission_set_is_breakglass() {
        let verdict = decide(&Action::GrantActivated, &matched(None, None)).unwrap();
        assert_eq!(verdict, Verdict::Decided(AlertDecision::Breakglass));
    }

    #[test]
    fn test_activated_without_match_is_no_alert() {
        let verdict = decide(&Action::GrantActivated, &TargetMatch::default()).unwrap();
        assert_eq!(verdict, Verdict::Decided(AlertDecision::NoAlert));
    }

    #[test]
    fn test_requested_without_match_is_no_alert_even_without_targets() {
        let verdict = decide(&Action::GrantRequested, &TargetMatch::default()).unwrap();
        assert_eq!(verdict, Verdict::Decided(AlertDecision::NoAlert));
    }

    #[test]
    fn test_requested_with_match_needs_status() {
        let verdict = decide(&Action::GrantRequested, &matched(Some("g1"), Some("r1"))).unwrap();
        assert_eq!(
            verdict,
            Verdict::NeedsGrantStatus(GrantLookup {
                grant_id: "g1".to_string(),
                access_request_id: "r1".to_string(),
            })
        );
    }

    #[test]
    fn test_requested_missing_grant() {
        let err = decide(&Action::GrantRequested, &matched(None, Some("r1"))).unwrap_err();
        assert!(matches!(
            err,
            AlertError::MissingRequiredTarget {
                target_type: "Access::Grant"
            }
        ));
    }

    #[test]
    fn test_requested_missing_access_request() {
        let err = decide(&Action::GrantRequested, &matched(Some("g1"), None)).unwrap_err();
        assert!(matches!(
            err,
            AlertError::MissingRequiredTarget {
                target_type: "Access::Request"
            }
        ));
    }

    #[test]
    fn test_conclude() {
        let watch = WatchConfig::new("ps-1", "https://cf.example.com");
        let lookup = GrantLookup {
            grant_id: "g1".to_string(),
            access_request_id: "r1".to_string(),
        };

        assert_eq!(
            lookup.clone().conclude(&GrantStatus::Pending, &watch),
            AlertDecision::PendingReview(PendingReviewAlert {
                grant_id: "g1".to_string(),
                access_request_id: "r1".to_string(),
                url: "https://cf.example.com/access/requests/r1".to_string(),
            })
        );
        for status in [
            GrantStatus::Active,
            GrantStatus::Closed,
            GrantStatus::Revoked,
            GrantStatus::Unknown("x".to_string()),
        ] {
            assert_eq!(lookup.clone().conclude(&status, &watch), AlertDecision::NoAlert);
        }
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(AlertDecision::PendingReview(PendingReviewAlert {
            grant_id: "g1".to_string(),
            access_request_id: "r1".to_string(),
            url: "https://cf.example.com/access/requests/r1".to_string(),
        }))
        .unwrap();
        assert_eq!(json["decision"], "pending_review");
        assert_eq!(json["grant_id"], "g1");
        assert_eq!(
            serde_json::to_value(AlertDecision::Breakglass).unwrap()["decision"],
            "breakglass"
        );
    }
}
