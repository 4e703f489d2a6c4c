//! HTTP routes.

use crate::dispatch::dispatch;
use crate::error::ApiError;
use crate::middleware::require_shared_secret;
use crate::state::AppState;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    middleware,
    routing::{get, post},
};
use grantwatch_policy::AlertDecision;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

/// Response body for an accepted webhook.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub decision: AlertDecision,
}

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>, webhook_path: &str) -> Router {
    let webhook = Router::new()
        .route(webhook_path, post(handle_webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_shared_secret,
        ));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle an audit log webhook delivery.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("audit_webhook", %request_id);

    async move {
        let decision = state.pipeline.process(&body).await?;
        dispatch(&decision, state.pipeline.watch());
        Ok::<_, ApiError>(Json(WebhookResponse {
            request_id,
            decision,
        }))
    }
    .instrument(span)
    .await
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "grantwatch-server" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::AUTHORIZATION};
    use grantwatch_core::GrantwatchConfig;
    use grantwatch_policy::{GrantStatus, GrantsClient, GrantsError};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";
    const WATCHED: &str = "ps-watched";

    struct StaticGrants(Result<GrantStatus, ()>);

    #[async_trait]
    impl GrantsClient for StaticGrants {
        async fn get_grant_status(&self, _grant_id: &str) -> Result<GrantStatus, GrantsError> {
            self.0
                .clone()
                .map_err(|_| GrantsError::Transport("connection refused".to_string()))
        }
    }

    fn app(grants: StaticGrants) -> Router {
        let mut cfg = GrantwatchConfig::default();
        cfg.watch.permission_set_id = WATCHED.to_string();
        cfg.watch.access_url = "https://cf.example.com".to_string();
        cfg.server.shared_secret = Some(SECRET.to_string());
        let state = AppState::new(&cfg, Arc::new(grants)).unwrap();
        create_router(Arc::new(state), &cfg.server.webhook_path)
    }

    fn event(action: &str, targets: serde_json::Value) -> String {
        json!({
            "id": "evt_1",
            "targets": targets,
            "action": action,
            "actor": {"type": "CF::User", "id": "usr_1"},
            "message": "",
            "occurred_at": "2024-03-01T10:15:30Z",
            "index": 0
        })
        .to_string()
    }

    fn requested() -> String {
        event(
            "grant.requested",
            json!([
                {"type": "AWS::IDC::PermissionSet", "id": WATCHED},
                {"type": "Access::Grant", "id": "g1"},
                {"type": "Access::Request", "id": "r1"}
            ]),
        )
    }

    fn post(body: String, secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header(AUTHORIZATION, secret);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = app(StaticGrants(Ok(GrantStatus::Active)))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_secret_is_rejected() {
        let response = app(StaticGrants(Ok(GrantStatus::Pending)))
            .oneshot(post(requested(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let response = app(StaticGrants(Ok(GrantStatus::Pending)))
            .oneshot(post(requested(), Some("Bearer test-secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_pending_request_returns_review_alert() {
        let response = app(StaticGrants(Ok(GrantStatus::Pending)))
            .oneshot(post(requested(), Some(SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["decision"], "pending_review");
        assert_eq!(body["grant_id"], "g1");
        assert_eq!(body["access_request_id"], "r1");
        assert_eq!(body["url"], "https://cf.example.com/access/requests/r1");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_breakglass() {
        let body = event(
            "grant.activated",
            json!([{"type": "AWS::IDC::PermissionSet", "id": WATCHED}]),
        );
        let response = app(StaticGrants(Err(())))
            .oneshot(post(body, Some(SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["decision"], "breakglass");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_bad_request() {
        let response = app(StaticGrants(Ok(GrantStatus::Pending)))
            .oneshot(post("{not json".to_string(), Some(SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "malformed_payload");
    }

    #[tokio::test]
    async fn test_missing_target_is_unprocessable() {
        let body = event(
            "grant.requested",
            json!([{"type": "AWS::IDC::PermissionSet", "id": WATCHED}]),
        );
        let response = app(StaticGrants(Ok(GrantStatus::Pending)))
            .oneshot(post(body, Some(SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"], "missing_required_target");
    }

    #[tokio::test]
    async fn test_grant_lookup_failure_is_bad_gateway() {
        let response = app(StaticGrants(Err(())))
            .oneshot(post(requested(), Some(SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"], "grant_lookup_failed");
    }
}
