//! Target matching.
//!
//! Extracts the identifiers the alert rules care about from an event's
//! target list in a single fold.

use grantwatch_audit::{Entity, entity_types};
use serde::Serialize;

/// What an event's targets say about the watched permission set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetMatch {
    /// A target is the watched permission set.
    pub matches_permission_set: bool,
    /// ID of the `Access::Grant` target. The last one wins if several exist.
    pub grant_id: Option<String>,
    /// ID of the `Access::Request` target. The last one wins if several exist.
    pub access_request_id: Option<String>,
    /// Number of `Access::Grant` targets seen.
    pub grant_count: usize,
    /// Number of `Access::Request` targets seen.
    pub access_request_count: usize,
}

impl TargetMatch {
    /// More than one grant or access request target was present.
    pub fn is_ambiguous(&self) -> bool {
        self.grant_count > 1 || self.access_request_count > 1
    }

    fn absorb(mut self, target: &Entity, permission_set_id: &str) -> Self {
        match target.entity_type.as_str() {
            entity_types::PERMISSION_SET => {
                self.matches_permission_set |= target.id == permission_set_id;
            }
            entity_types::GRANT => {
                self.grant_id = Some(target.id.clone());
                self.grant_count += 1;
            }
            entity_types::REQUEST => {
                self.access_request_id = Some(target.id.clone());
                self.access_request_count += 1;
            }
            _ => {}
        }
        self
    }
}

/// Scan `targets` for the watched permission set and the grant and access
/// request identifiers. Never fails; absent targets are `None`.
pub fn match_targets(targets: &[Entity], permission_set_id: &str) -> TargetMatch {
    targets
        .iter()
        .fold(TargetMatch::default(), |acc, target| {
            acc.absorb(target, permission_set_id)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PS: &str = "ps-0123456789abcdef";

    fn targets() -> Vec<Entity> {
        vec![
            Entity::new(entity_types::PERMISSION_SET, PS),
            Entity::new(entity_types::GRANT, "gra_1"),
            Entity::new(entity_types::REQUEST, "req_1"),
            Entity::new("AWS::Account", "123456789012"),
        ]
    }

    #[test]
    fn test_match_all_targets() {
        let m = match_targets(&targets(), PS);
        assert_eq!(
            m,
            TargetMatch {
                matches_permission_set: true,
                grant_id: Some("gra_1".to_string()),
                access_request_id: Some("req_1".to_string()),
                grant_count: 1,
                access_request_count: 1,
            }
        );
        assert!(!m.is_ambiguous());
    }

    #[test]
    fn test_empty_targets() {
        assert_eq!(match_targets(&[], PS), TargetMatch::default());
    }

    #[test]
    fn test_other_permission_set_does_not_match() {
        let m = match_targets(&targets(), "ps-other");
        assert!(!m.matches_permission_set);
        assert_eq!(m.grant_id.as_deref(), Some("gra_1"));
    }

    #[test]
    fn test_permission_set_id_is_case_sensitive() {
        let m = match_targets(&targets(), &PS.to_uppercase());
        assert!(!m.matches_permission_set);
    }

    #[test]
    fn test_permission_set_id_on_other_type_does_not_match() {
        let t = vec![Entity::new("AWS::Account", PS)];
        assert!(!match_targets(&t, PS).matches_permission_set);
    }

    #[test]
    fn test_match_is_order_invariant() {
        let base = targets();
        let expected = match_targets(&base, PS);

        // Every rotation and its reverse
        for shift in 0..base.len() {
            let mut rotated = base.clone();
            rotated.rotate_left(shift);
            assert_eq!(match_targets(&rotated, PS), expected);
            rotated.reverse();
            assert_eq!(match_targets(&rotated, PS), expected);
        }
    }

    #[test]
    fn test_matching_permission_set_among_others() {
        let t = vec![
            Entity::new(entity_types::PERMISSION_SET, "ps-a"),
            Entity::new(entity_types::PERMISSION_SET, PS),
            Entity::new(entity_types::PERMISSION_SET, "ps-b"),
        ];
        assert!(match_targets(&t, PS).matches_permission_set);
    }

    #[test]
    fn test_duplicate_grants_last_wins_and_flags_ambiguity() {
        let t = vec![
            Entity::new(entity_types::GRANT, "gra_1"),
            Entity::new(entity_types::GRANT, "gra_2"),
        ];
        let m = match_targets(&t, PS);
        assert_eq!(m.grant_id.as_deref(), Some("gra_2"));
        assert_eq!(m.grant_count, 2);
        assert!(m.is_ambiguous());
    }
}
