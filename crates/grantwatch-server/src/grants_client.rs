//! Common Fate grants API client.
//!
//! Speaks the Connect protocol's unary JSON encoding and authenticates with
//! an OIDC client-credentials token, which is cached until shortly before it
//! expires.

use async_trait::async_trait;
use grantwatch_core::GrantsConfig;
use grantwatch_policy::{GrantStatus, GrantsClient, GrantsError};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use url::Url;

/// Connect procedure path for fetching a grant.
const GET_GRANT_PROCEDURE: &str = "commonfate.access.v1alpha1.GrantsService/GetGrant";

/// Tokens are refreshed this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct ClientCredentials {
    issuer: Url,
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("issuer", &self.issuer.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    token_endpoint: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GetGrantResponse {
    grant: Grant,
}

#[derive(Debug, Deserialize)]
struct Grant {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConnectErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// [`GrantsClient`] backed by the Common Fate API.
pub struct ConnectGrantsClient {
    http: reqwest::Client,
    api_url: Url,
    credentials: ClientCredentials,
    token_endpoint: OnceCell<Url>,
    token: Mutex<Option<CachedToken>>,
}

impl ConnectGrantsClient {
    /// Create a client from validated configuration.
    pub fn new(config: &GrantsConfig) -> Result<Self, GrantsError> {
        let api_url = parse_base_url(&config.api_url)?;
        let issuer = parse_base_url(&config.oidc_issuer)?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or_else(|| GrantsError::Unauthenticated("no client secret configured".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("grantwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GrantsError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_url,
            credentials: ClientCredentials {
                issuer,
                client_id: config.client_id.clone(),
                client_secret,
            },
            token_endpoint: OnceCell::new(),
            token: Mutex::new(None),
        })
    }

    fn get_grant_url(&self) -> Result<Url, GrantsError> {
        self.api_url
            .join(GET_GRANT_PROCEDURE)
            .map_err(|e| GrantsError::InvalidResponse(format!("invalid grants URL: {e}")))
    }

    async fn token_endpoint(&self) -> Result<&Url, GrantsError> {
        self.token_endpoint
            .get_or_try_init(|| async {
                let discovery = self
                    .credentials
                    .issuer
                    .join(".well-known/openid-configuration")
                    .map_err(|e| GrantsError::Unauthenticated(format!("invalid issuer: {e}")))?;

                let response = self
                    .http
                    .get(discovery)
                    .send()
                    .await
                    .map_err(|e| GrantsError::Transport(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(GrantsError::Unauthenticated(format!(
                        "OIDC discovery returned {}",
                        response.status()
                    )));
                }
                let doc: DiscoveryDocument = response
                    .json()
                    .await
                    .map_err(|e| GrantsError::InvalidResponse(e.to_string()))?;

                tracing::debug!(token_endpoint = %doc.token_endpoint, "Discovered OIDC token endpoint");
                Url::parse(&doc.token_endpoint)
                    .map_err(|e| GrantsError::InvalidResponse(format!("invalid token endpoint: {e}")))
            })
            .await
    }

    async fn access_token(&self) -> Result<String, GrantsError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let endpoint = self.token_endpoint().await?.clone();
        let response = self
            .http
            .post(endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| GrantsError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GrantsError::Unauthenticated(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GrantsError::InvalidResponse(e.to_string()))?;

        let lifetime = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let refresh_at = Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN);

        tracing::debug!(expires_in_secs = lifetime.as_secs(), "Obtained grants API access token");
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at,
        });
        Ok(token.access_token)
    }

    async fn forget_token(&self) {
        self.token.lock().await.take();
    }
}

#[async_trait]
impl GrantsClient for ConnectGrantsClient {
    async fn get_grant_status(&self, grant_id: &str) -> Result<GrantStatus, GrantsError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(self.get_grant_url()?)
            .bearer_auth(token)
            .header("Connect-Protocol-Version", "1")
            .json(&serde_json::json!({ "id": grant_id }))
            .send()
            .await
            .map_err(|e| GrantsError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.forget_token().await;
            return Err(GrantsError::Unauthenticated(
                "grants API rejected the access token".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.json::<ConnectErrorBody>().await.unwrap_or_default();
            return Err(GrantsError::Status {
                code: if body.code.is_empty() {
                    status.as_u16().to_string()
                } else {
                    body.code
                },
                message: body.message,
            });
        }

        let body: GetGrantResponse = response
            .json()
            .await
            .map_err(|e| GrantsError::InvalidResponse(e.to_string()))?;

        Ok(body
            .grant
            .status
            .as_deref()
            .map(GrantStatus::from_wire)
            .unwrap_or(GrantStatus::Unspecified))
    }
}

/// Parse a base URL, making sure relative joins append to its path.
fn parse_base_url(raw: &str) -> Result<Url, GrantsError> {
    let mut url =
        Url::parse(raw).map_err(|e| GrantsError::InvalidResponse(format!("invalid URL {raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
