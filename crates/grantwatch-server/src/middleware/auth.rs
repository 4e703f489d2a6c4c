use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Axum middleware rejecting requests whose `Authorization` header is not
/// exactly the pre-shared secret.
pub async fn require_shared_secret(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = extract_authorization(req.headers()).ok_or(ApiError::Unauthorized)?;
    if !secrets_match(&state.shared_secret, provided) {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}

fn extract_authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Constant-time comparison of the configured and provided secrets.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        // Same work as a full comparison so length is not observable by timing
        let _ = expected.ct_eq(expected);
        return false;
    }
    expected.ct_eq(provided).into()
}
