//! Config persistence: the local edit set and the published snapshot.

mod local;
mod remote;

pub use local::LocalStorage;
pub use remote::{RemoteError, RemoteSource, PUBLISHED_CONFIG_PATH};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::SiteConfig;
use crate::publish::PublishCredentials;

/// Storage key of the local edit set.
pub const STORAGE_KEY: &str = "imran-template-config-v1";
/// Storage key of the publish credentials.
pub const CREDENTIALS_KEY: &str = "imran-dev-credentials-v1";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Local and remote config sources for one page.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    local: LocalStorage,
    remote: RemoteSource,
}

impl ConfigStore {
    pub fn new(local: LocalStorage, remote: RemoteSource) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &LocalStorage {
        &self.local
    }

    pub fn remote(&self) -> &RemoteSource {
        &self.remote
    }

    /// The persisted local edits. Missing or unreadable state yields the
    /// default config.
    pub fn load_local(&self) -> SiteConfig {
        let raw = match self.local.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SiteConfig::default(),
            Err(e) => {
                tracing::warn!(error = %e, "local edits unreadable, using defaults");
                return SiteConfig::default();
            }
        };
        match SiteConfig::from_json(&raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "local edits corrupt, using defaults");
                SiteConfig::default()
            }
        }
    }

    /// The published snapshot; unavailable snapshots yield the default config.
    pub async fn load_remote(&self) -> SiteConfig {
        self.remote.load().await
    }

    /// Remote overlaid by local.
    pub async fn load_merged(&self) -> SiteConfig {
        let local = self.load_local();
        let remote = self.load_remote().await;
        SiteConfig::merge(&remote, &local)
    }

    /// Persists the whole config in one write.
    pub fn save(&self, config: &SiteConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string(config)?;
        self.local.set(STORAGE_KEY, &json)
    }

    pub fn clear_local(&self) -> Result<(), StoreError> {
        self.local.remove(STORAGE_KEY)
    }

    /// Saved publish credentials with defaults filled in for missing fields.
    pub fn load_credentials(&self) -> PublishCredentials {
        let raw = match self.local.get(CREDENTIALS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return PublishCredentials::default(),
            Err(e) => {
                tracing::warn!(error = %e, "credentials unreadable, using defaults");
                return PublishCredentials::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "credentials corrupt, using defaults");
            PublishCredentials::default()
        })
    }

    pub fn save_credentials(&self, credentials: &PublishCredentials) -> Result<(), StoreError> {
        let json = serde_json::to_string(credentials)?;
        self.local.set(CREDENTIALS_KEY, &json)
    }
}
