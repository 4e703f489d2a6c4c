//! Audit log event types.
//!
//! User-facing audit trail events emitted by Common Fate to webhook
//! integrations. Field names are the wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Entity type names referenced by audit log targets.
pub mod entity_types {
    /// AWS Identity Center permission set.
    pub const PERMISSION_SET: &str = "AWS::IDC::PermissionSet";
    /// Common Fate grant.
    pub const GRANT: &str = "Access::Grant";
    /// Common Fate access request.
    pub const REQUEST: &str = "Access::Request";
}

/// The action recorded by an audit log event.
///
/// Values not known to this crate decode to [`Action::Unknown`] so that new
/// upstream actions never fail decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    GrantRequested,
    GrantApproved,
    GrantActivated,
    GrantProvisioned,
    GrantProvisioningAttempted,
    GrantExtended,
    GrantDeprovisioned,
    GrantCancelled,
    GrantRevoked,
    GrantProvisioningError,
    GrantDeprovisioningError,
    GrantBreakglassActivated,
    ProxySessionStarted,
    ProxySessionEnded,
    GrantForceClosed,
    /// An action this crate does not recognise, kept verbatim.
    Unknown(String),
}

impl Action {
    /// Every known action, in wire order.
    pub const KNOWN: [Action; 15] = [
        Action::GrantRequested,
        Action::GrantApproved,
        Action::GrantActivated,
        Action::GrantProvisioned,
        Action::GrantProvisioningAttempted,
        Action::GrantExtended,
        Action::GrantDeprovisioned,
        Action::GrantCancelled,
        Action::GrantRevoked,
        Action::GrantProvisioningError,
        Action::GrantDeprovisioningError,
        Action::GrantBreakglassActivated,
        Action::ProxySessionStarted,
        Action::ProxySessionEnded,
        Action::GrantForceClosed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::GrantRequested => "grant.requested",
            Self::GrantApproved => "grant.approved",
            Self::GrantActivated => "grant.activated",
            Self::GrantProvisioned => "grant.provisioned",
            Self::GrantProvisioningAttempted => "grant.provisioning_attempted",
            Self::GrantExtended => "grant.extended",
            Self::GrantDeprovisioned => "grant.deprovisioned",
            Self::GrantCancelled => "grant.cancelled",
            Self::GrantRevoked => "grant.revoked",
            Self::GrantProvisioningError => "grant.provisioning_error",
            Self::GrantDeprovisioningError => "grant.deprovisioning_error",
            Self::GrantBreakglassActivated => "grant.breakglass_activated",
            Self::ProxySessionStarted => "proxy.session.started",
            Self::ProxySessionEnded => "proxy.session.ended",
            Self::GrantForceClosed => "grant.force_closed",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for Action {
    fn from(raw: String) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|known| known.as_str() == raw)
            .unwrap_or(Self::Unknown(raw))
    }
}

impl From<&str> for Action {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed entity reference. Equality is exact on `(type, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: String,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn is_type(&self, entity_type: &str) -> bool {
        self.entity_type == entity_type
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::\"{}\"", self.entity_type, self.id)
    }
}

/// One link in the caller identity chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityLink {
    pub id: Entity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Who performed the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: String,
    /// Only present on webhook copies of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Only present on webhook copies of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Actor {
    pub fn eid(&self) -> Entity {
        Entity::new(&self.entity_type, &self.id)
    }
}

impl From<Entity> for Actor {
    fn from(entity: Entity) -> Self {
        Self {
            entity_type: entity.entity_type,
            id: entity.id,
            name: None,
            email: None,
        }
    }
}

/// The principal the action relates to. For grant actions this is the
/// principal of the grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

impl Principal {
    pub fn eid(&self) -> Entity {
        Entity::new(&self.entity_type, &self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authz: Option<AuthzContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_session: Option<ProxySessionContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub client_addr: String,
    #[serde(default)]
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzContext {
    /// Authorization evaluation ID.
    #[serde(rename = "eval", default)]
    pub eval_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySessionContext {
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Justification {
    #[serde(default)]
    pub reason: String,
}

/// A user-facing audit trail event relating to a grant.
///
/// Constructed once per inbound payload and never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// The resources the event relates to. Order is preserved but carries no
    /// meaning.
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<Entity>,

    pub action: Action,

    /// Identity chain of the caller, including the OIDC subject used for the
    /// API call that produced the action.
    #[serde(default, deserialize_with = "null_as_default")]
    pub caller_identity_chain: Vec<IdentityLink>,

    pub actor: Actor,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,

    pub occurred_at: DateTime<Utc>,

    /// Only present on webhook copies of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<Justification>,

    /// Secondary sort key for events sharing `occurred_at`. Not unique.
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: i64,
}

impl AuditLog {
    /// Targets of the given entity type, in payload order.
    pub fn targets_of_type<'a>(&'a self, entity_type: &'a str) -> impl Iterator<Item = &'a Entity> {
        self.targets.iter().filter(move |t| t.is_type(entity_type))
    }

    /// Order by `occurred_at`, then by `index`.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.occurred_at
            .cmp(&other.occurred_at)
            .then(self.index.cmp(&other.index))
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] action actor=type::"id" targets=[...] message="..."`
    pub fn to_log_line(&self) -> String {
        let targets: Vec<String> = self.targets.iter().map(ToString::to_string).collect();
        let mut line = format!(
            "[{}] {} actor={} targets=[{}]",
            self.occurred_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.action,
            self.actor.eid(),
            targets.join(","),
        );
        if !self.message.is_empty() {
            line.push_str(&format!(" message=\"{}\"", self.message.replace('"', "'")));
        }
        line
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
