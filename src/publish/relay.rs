//! Publishes through the password-protected relay service.

use serde::{Deserialize, Serialize};

use super::PublishError;
use crate::models::SiteConfig;

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    password: &'a str,
    config: &'a SiteConfig,
}

#[derive(Debug, Deserialize, Default)]
struct RelayResponse {
    #[serde(default)]
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    url: String,
    password: String,
    client: reqwest::Client,
}

impl RelayClient {
    pub fn new(url: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            password: password.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn publish(&self, config: &SiteConfig) -> Result<(), PublishError> {
        let response = self
            .client
            .post(&self.url)
            .json(&RelayRequest {
                password: &self.password,
                config,
            })
            .send()
            .await
            .map_err(|e| PublishError::Http(e.to_string()))?;

        let status = response.status();
        let body: RelayResponse = response.json().await.unwrap_or_default();
        if !status.is_success() || !body.ok {
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message: body
                    .error
                    .unwrap_or_else(|| format!("Relay returned {}", status)),
            });
        }
        tracing::info!(url = %self.url, "published config through relay");
        Ok(())
    }
}
