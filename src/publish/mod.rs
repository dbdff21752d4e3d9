//! Publishing the config so every visitor sees it.

mod github;
mod relay;

pub use github::{GitHubContents, DEFAULT_API_BASE};
pub use relay::RelayClient;

#[cfg(test)]
pub(crate) use github::tests::FakeGitHub;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::models::SiteConfig;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Missing publish setting: {0}")]
    MissingField(&'static str),

    #[error("A publish is already in progress")]
    InFlight,

    #[error("Network error: {0}")]
    Http(String),

    #[error("Publish rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn default_branch() -> String {
    "main".to_string()
}

/// Settings for publishing, persisted under the credentials key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishCredentials {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Relay password; only used when publishing through the relay.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
}

impl Default for PublishCredentials {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            password: String::new(),
        }
    }
}

impl PublishCredentials {
    /// Fills an empty owner and repository from a GitHub Pages address
    /// (`https://<owner>.github.io/<repo>/`).
    pub fn with_site_defaults(mut self, site_url: Option<&str>) -> Self {
        let Some(url) = site_url.and_then(|u| reqwest::Url::parse(u).ok()) else {
            return self;
        };
        if self.owner.is_empty() {
            if let Some(owner) = url
                .host_str()
                .and_then(|host| host.strip_suffix(".github.io"))
            {
                self.owner = owner.to_string();
            }
        }
        if self.repo.is_empty() {
            if let Some(repo) = url.path_segments().and_then(|mut segments| segments.find(|s| !s.is_empty())) {
                self.repo = repo.to_string();
            }
        }
        self
    }

    /// Trims every field and checks what a direct publish needs.
    pub fn validate(&self) -> Result<PublishCredentials, PublishError> {
        let branch = self.branch.trim();
        let validated = PublishCredentials {
            token: self.token.trim().to_string(),
            owner: self.owner.trim().to_string(),
            repo: self.repo.trim().to_string(),
            branch: if branch.is_empty() {
                default_branch()
            } else {
                branch.to_string()
            },
            password: self.password.clone(),
        };
        if validated.token.is_empty() {
            return Err(PublishError::MissingField("token"));
        }
        if validated.owner.is_empty() {
            return Err(PublishError::MissingField("owner"));
        }
        if validated.repo.is_empty() {
            return Err(PublishError::MissingField("repo"));
        }
        Ok(validated)
    }
}

/// Where a publish goes.
#[derive(Debug, Clone)]
pub enum PublishTarget {
    Relay(RelayClient),
    GitHub(GitHubContents),
}

/// Sends configs upstream, one at a time.
#[derive(Debug, Default)]
pub struct Publisher {
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_publishing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Publishes `config`. A call made while another is still running is
    /// rejected with [`PublishError::InFlight`]. Local state is never touched.
    pub async fn publish(
        &self,
        target: &PublishTarget,
        config: &SiteConfig,
    ) -> Result<(), PublishError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PublishError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let result = match target {
            PublishTarget::Relay(client) => client.publish(config).await,
            PublishTarget::GitHub(client) => {
                let value = serde_json::to_value(config)?;
                client.publish_json(&value).await
            }
        };
        if let Err(e) = &result {
            tracing::warn!(error = %e, "publish failed");
        }
        result
    }
}
