//! Grant status resolution.
//!
//! The grants service is an injected capability: anything implementing
//! [`GrantsClient`] can back the resolver, which bounds every lookup with a
//! timeout. Dropping the returned future cancels the lookup.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AlertError, GrantsError};

/// Lifecycle status of a grant as reported by the grants service.
///
/// Only [`GrantStatus::Pending`] changes alerting behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Unspecified,
    Pending,
    Active,
    Provisioned,
    Deprovisioned,
    Closed,
    Cancelled,
    Revoked,
    ProvisioningError,
    DeprovisioningError,
    /// A status this crate does not recognise, kept verbatim.
    Unknown(String),
}

impl GrantStatus {
    /// Parse a protobuf enum name such as `GRANT_STATUS_PENDING`.
    ///
    /// The `GRANT_STATUS_` prefix is optional and matching ignores case.
    pub fn from_wire(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("GRANT_STATUS_").unwrap_or(&upper);
        match name {
            "UNSPECIFIED" | "" => Self::Unspecified,
            "PENDING" => Self::Pending,
            "ACTIVE" => Self::Active,
            "PROVISIONED" => Self::Provisioned,
            "DEPROVISIONED" => Self::Deprovisioned,
            "CLOSED" => Self::Closed,
            "CANCELLED" => Self::Cancelled,
            "REVOKED" => Self::Revoked,
            "PROVISIONING_ERROR" => Self::ProvisioningError,
            "DEPROVISIONING_ERROR" => Self::DeprovisioningError,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "unknown({raw})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Client for the external grants service.
#[async_trait]
pub trait GrantsClient: Send + Sync {
    /// Fetch the current status of a grant.
    async fn get_grant_status(&self, grant_id: &str) -> Result<GrantStatus, GrantsError>;
}

#[async_trait]
impl<T: GrantsClient + ?Sized> GrantsClient for Arc<T> {
    async fn get_grant_status(&self, grant_id: &str) -> Result<GrantStatus, GrantsError> {
        (**self).get_grant_status(grant_id).await
    }
}

/// Resolves grant IDs to statuses through a [`GrantsClient`].
///
/// Lookups are not retried.
pub struct GrantStatusResolver<C> {
    client: C,
    timeout: Duration,
}

impl<C: GrantsClient> GrantStatusResolver<C> {
    pub fn new(client: C, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look up the status of `grant_id`.
    pub async fn resolve(&self, grant_id: &str) -> Result<GrantStatus, AlertError> {
        tracing::debug!(grant_id, "Looking up grant status");

        let outcome = tokio::time::timeout(self.timeout, self.client.get_grant_status(grant_id))
            .await
            .unwrap_or(Err(GrantsError::Timeout(self.timeout)));

        match outcome {
            Ok(status) => {
                tracing::debug!(grant_id, %status, "Grant status resolved");
                Ok(status)
            }
            Err(source) => Err(AlertError::GrantLookupFailed {
                grant_id: grant_id.to_string(),
                source,
            }),
        }
    }
}
