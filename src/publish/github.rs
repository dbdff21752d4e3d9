//! Writes the published config through the GitHub contents API.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PublishCredentials, PublishError};
use crate::store::PUBLISHED_CONFIG_PATH;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = "storefront-publisher";

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct GitHubError {
    message: Option<String>,
}

/// Client for one file in one repository branch.
#[derive(Debug, Clone)]
pub struct GitHubContents {
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    path: String,
    token: String,
    message: String,
    client: reqwest::Client,
}

impl GitHubContents {
    pub fn new(credentials: &PublishCredentials) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: credentials.owner.clone(),
            repo: credentials.repo.clone(),
            branch: credentials.branch.clone(),
            path: PUBLISHED_CONFIG_PATH.to_string(),
            token: credentials.token.clone(),
            message: "Update site config from developer tools".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, self.path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }

    /// Revision marker of the current file, `None` when it does not exist yet.
    pub async fn current_sha(&self) -> Result<Option<String>, PublishError> {
        let url = format!(
            "{}?ref={}",
            self.contents_url(),
            urlencoding::encode(&self.branch)
        );
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| PublishError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(rejection(response, "Unable to read config file").await);
        }

        let entry: ContentsEntry = response
            .json()
            .await
            .map_err(|e| PublishError::Http(e.to_string()))?;
        Ok(entry.sha)
    }

    /// Creates or replaces the file with `content`.
    pub async fn put(&self, content: &str, sha: Option<String>) -> Result<(), PublishError> {
        let body = PutContents {
            message: &self.message,
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.branch,
            sha,
        };
        let response = self
            .authorized(self.client.put(self.contents_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to write config file").await);
        }
        Ok(())
    }

    /// Writes `config` as pretty JSON, updating the file when it exists.
    pub async fn publish_json(&self, config: &Value) -> Result<(), PublishError> {
        let content = serde_json::to_string_pretty(config)?;
        let sha = self.current_sha().await?;
        let created = sha.is_none();
        self.put(&content, sha).await?;
        tracing::info!(
            owner = %self.owner,
            repo = %self.repo,
            branch = %self.branch,
            path = %self.path,
            created,
            "published config"
        );
        Ok(())
    }
}

async fn rejection(response: reqwest::Response, fallback: &str) -> PublishError {
    let status = response.status().as_u16();
    let body: GitHubError = response.json().await.unwrap_or_default();
    PublishError::Rejected {
        status,
        message: body.message.unwrap_or_else(|| fallback.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in for the contents endpoint of one repository.
    #[derive(Clone, Default)]
    pub(crate) struct FakeGitHub {
        pub files: Arc<Mutex<HashMap<String, (String, String)>>>,
        pub puts: Arc<Mutex<Vec<Value>>>,
        pub auth: Arc<Mutex<Vec<String>>>,
    }

    async fn get_file(
        State(fake): State<FakeGitHub>,
        Path((_owner, _repo, path)): Path<(String, String, String)>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<Value>) {
        if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
            fake.auth.lock().unwrap().push(auth.to_string());
        }
        if headers.get("user-agent").is_none() {
            return (StatusCode::FORBIDDEN, Json(json!({ "message": "UA required" })));
        }
        let branch = query.get("ref").cloned().unwrap_or_default();
        match fake.files.lock().unwrap().get(&format!("{}@{}", path, branch)) {
            Some((sha, _)) => (StatusCode::OK, Json(json!({ "sha": sha }))),
            None => (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))),
        }
    }

    async fn put_file(
        State(fake): State<FakeGitHub>,
        Path((_owner, _repo, path)): Path<(String, String, String)>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let branch = body["branch"].as_str().unwrap_or_default().to_string();
        let key = format!("{}@{}", path, branch);
        let mut files = fake.files.lock().unwrap();
        let existing = files.get(&key).map(|(sha, _)| sha.clone());
        if existing.as_deref() != body["sha"].as_str() {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "message": "sha mismatch" })),
            );
        }
        let content = String::from_utf8(
            STANDARD
                .decode(body["content"].as_str().unwrap_or_default())
                .unwrap(),
        )
        .unwrap();
        let sha = format!("sha{}", fake.puts.lock().unwrap().len() + 1);
        files.insert(key, (sha, content));
        fake.puts.lock().unwrap().push(body);
        (StatusCode::OK, Json(json!({ "content": {} })))
    }

    impl FakeGitHub {
        pub fn router(&self) -> Router {
            Router::new()
                .route(
                    "/repos/{owner}/{repo}/contents/{path}",
                    get(get_file).put(put_file),
                )
                .with_state(self.clone())
        }

        pub async fn serve(&self) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let router = self.router();
            tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });
            format!("http://{}", addr)
        }

        pub fn content(&self, path: &str, branch: &str) -> Option<String> {
            self.files
                .lock()
                .unwrap()
                .get(&format!("{}@{}", path, branch))
                .map(|(_, content)| content.clone())
        }
    }

    fn credentials() -> PublishCredentials {
        PublishCredentials {
            token: "ghp_test".to_string(),
            owner: "acme".to_string(),
            repo: "shop".to_string(),
            branch: "main".to_string(),
            password: String::new(),
        }
    }

    #[tokio::test]
    async fn test_creates_then_updates_file() {
        let fake = FakeGitHub::default();
        let base = fake.serve().await;
        let client = GitHubContents::new(&credentials()).with_api_base(base);

        client.publish_json(&json!({ "texts": {} })).await.unwrap();
        client
            .publish_json(&json!({ "texts": { "t1": { "ar": "س" } } }))
            .await
            .unwrap();

        let puts = fake.puts.lock().unwrap().clone();
        assert_eq!(puts.len(), 2);
        assert!(puts[0].get("sha").is_none());
        assert_eq!(puts[1]["sha"], "sha1");
        assert_eq!(puts[1]["branch"], "main");

        let stored: Value =
            serde_json::from_str(&fake.content("site-config.json", "main").unwrap()).unwrap();
        assert_eq!(stored["texts"]["t1"]["ar"], "س");
        assert!(fake
            .auth
            .lock()
            .unwrap()
            .iter()
            .all(|a| a == "Bearer ghp_test"));
    }

    #[tokio::test]
    async fn test_rejection_carries_server_message() {
        let router = Router::new().route(
            "/repos/{owner}/{repo}/contents/{path}",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Bad credentials" })),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client =
            GitHubContents::new(&credentials()).with_api_base(format!("http://{}", addr));
        let err = client.publish_json(&json!({})).await.unwrap_err();
        match err {
            PublishError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
