//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grantwatch_policy::AlertError;
use serde_json::json;

/// Errors returned by webhook handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request did not carry the shared secret.
    Unauthorized,
    /// The event could not be decided.
    Alert(AlertError),
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        Self::Alert(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Alert(AlertError::MalformedPayload(_)) => StatusCode::BAD_REQUEST,
            Self::Alert(AlertError::MissingRequiredTarget { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Alert(AlertError::GrantLookupFailed { .. }) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Alert(err) => err.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Unauthorized => "invalid authorization header".to_string(),
            Self::Alert(err) => err.to_string(),
        };

        match &self {
            Self::Unauthorized => tracing::warn!("Rejected webhook with invalid authorization header"),
            Self::Alert(AlertError::MalformedPayload(_)) => {
                tracing::warn!(error = %message, "Failed to parse audit log event")
            }
            Self::Alert(err) => tracing::error!(error = %message, kind = err.kind(), "Audit log event left undecided"),
        }

        (
            status,
            Json(json!({ "error": self.kind(), "message": message })),
        )
            .into_response()
    }
}
