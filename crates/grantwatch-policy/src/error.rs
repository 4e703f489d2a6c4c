//! Error types for alert decisions.
//!
//! Every variant is terminal for the event being processed: no partial
//! decision is produced and nothing is retried here.

use grantwatch_audit::DecodeError;
use std::time::Duration;
use thiserror::Error;

/// Why an event could not be decided.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The payload could not be decoded.
    #[error(transparent)]
    MalformedPayload(#[from] DecodeError),

    /// The action requires a target that the event does not carry.
    #[error("event is missing a required {target_type} target")]
    MissingRequiredTarget { target_type: &'static str },

    /// The grants service could not report the grant's status.
    #[error("failed to look up status of grant {grant_id}: {source}")]
    GrantLookupFailed {
        grant_id: String,
        #[source]
        source: GrantsError,
    },
}

impl AlertError {
    /// Short machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedPayload(_) => "malformed_payload",
            Self::MissingRequiredTarget { .. } => "missing_required_target",
            Self::GrantLookupFailed { .. } => "grant_lookup_failed",
        }
    }
}

/// Failures reported by a [`crate::GrantsClient`].
#[derive(Debug, Error)]
pub enum GrantsError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with an error.
    #[error("grants service returned {code}: {message}")]
    Status { code: String, message: String },

    /// Credentials were rejected or could not be obtained.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The lookup did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
