//! Password-protected publish relay.
//!
//! Accepts `POST {password, config}` from the editor and writes `config` to
//! the repository with a server-held token, so the token never leaves the
//! server.
//!
//! | Response | When |
//! |----------|------|
//! | `200 {ok: true}` | config written |
//! | `204` | `OPTIONS` preflight |
//! | `400 {error}` | body is not JSON or `config` is not an object |
//! | `401 {error}` | wrong or missing password |
//! | `405 {error}` | any other method |
//! | `500 {error}` | server settings missing or unexpected failure |
//! | upstream status | the contents API refused the read or write |

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::publish::{GitHubContents, PublishCredentials, PublishError, DEFAULT_API_BASE};
use crate::store::PUBLISHED_CONFIG_PATH;

const COMMIT_MESSAGE: &str = "Publish site config from developer panel";

/// Relay settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub password: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: String,
    pub config_path: String,
    pub token: Option<String>,
    pub api_base: String,
    pub port: u16,
}

impl RelaySettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            password: get("DEVELOPER_PASSWORD"),
            owner: get("GITHUB_OWNER"),
            repo: get("GITHUB_REPO"),
            branch: get("GITHUB_BRANCH").unwrap_or_else(|| "main".to_string()),
            config_path: get("CONFIG_PATH").unwrap_or_else(|| PUBLISHED_CONFIG_PATH.to_string()),
            token: get("GITHUB_TOKEN"),
            api_base: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            port: get("RELAY_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8787),
        }
    }

    /// Contents client for the configured repository, when complete.
    fn contents(&self) -> Option<GitHubContents> {
        let credentials = PublishCredentials {
            token: self.token.clone()?,
            owner: self.owner.clone()?,
            repo: self.repo.clone()?,
            branch: self.branch.clone(),
            password: String::new(),
        };
        Some(
            GitHubContents::new(&credentials)
                .with_api_base(&self.api_base)
                .with_path(&self.config_path)
                .with_message(COMMIT_MESSAGE),
        )
    }
}

#[derive(Clone)]
struct RelayState {
    settings: Arc<RelaySettings>,
}

fn cors() -> [(header::HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "content-type"),
    ]
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (status, cors(), Json(body)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    json_response(status, json!({ "error": message }))
}

async fn handle(State(state): State<RelayState>, method: Method, body: Bytes) -> Response {
    match method {
        Method::OPTIONS => (StatusCode::NO_CONTENT, cors()).into_response(),
        Method::POST => publish(&state.settings, &body).await,
        _ => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    }
}

async fn publish(settings: &RelaySettings, body: &[u8]) -> Response {
    let body: Value = match serde_json::from_slice(body) {
        Ok(body) => body,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body"),
    };

    let password = body.get("password").and_then(Value::as_str).unwrap_or("");
    if password.is_empty() || settings.password.as_deref() != Some(password) {
        tracing::warn!("rejected publish with bad password");
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let Some(config) = body.get("config").filter(|c| c.is_object()) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid config");
    };

    let Some(contents) = settings.contents() else {
        tracing::error!("GITHUB_OWNER, GITHUB_REPO and GITHUB_TOKEN must be set");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Missing server env vars");
    };

    match contents.publish_json(config).await {
        Ok(()) => json_response(StatusCode::OK, json!({ "ok": true })),
        Err(PublishError::Rejected { status, message }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            tracing::warn!(%status, %message, "contents API refused publish");
            error_response(status, &message)
        }
        Err(e) => {
            tracing::error!(error = %e, "publish failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// The relay's router; every path is handled the same way.
pub fn router(settings: RelaySettings) -> Router {
    Router::new().fallback(handle).with_state(RelayState {
        settings: Arc::new(settings),
    })
}
