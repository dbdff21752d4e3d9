//! The published config snapshot.

use chrono::Utc;
use reqwest::header::CACHE_CONTROL;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::SiteConfig;

/// File name of the published config next to the page.
pub const PUBLISHED_CONFIG_PATH: &str = "site-config.json";

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Published config returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Published config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the published config is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSource {
    /// Base URL of the site, or the full URL of the config file.
    Http(String),
    /// A directory holding `site-config.json`, or the file itself.
    File(PathBuf),
    /// No published config.
    Disabled,
}

impl RemoteSource {
    /// Picks the source from a site location: URLs are fetched over HTTP,
    /// anything else is a filesystem path.
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            RemoteSource::Http(location.to_string())
        } else {
            RemoteSource::File(PathBuf::from(location))
        }
    }

    /// Cache-busted URL of the config file.
    pub fn config_url(base: &str, now_millis: i64) -> String {
        let file = if base.ends_with(".json") {
            base.to_string()
        } else {
            format!("{}/{}", base.trim_end_matches('/'), PUBLISHED_CONFIG_PATH)
        };
        format!("{}?t={}", file, now_millis)
    }

    /// Loads and normalizes the snapshot. Every failure degrades to the
    /// default config.
    pub async fn load(&self) -> SiteConfig {
        match self.fetch().await {
            Ok(Some(raw)) => SiteConfig::normalize(&raw),
            Ok(None) => SiteConfig::default(),
            Err(e) => {
                tracing::warn!(error = %e, "published config unavailable, using defaults");
                SiteConfig::default()
            }
        }
    }

    /// The raw snapshot, or `None` when nothing has been published.
    pub async fn fetch(&self) -> Result<Option<Value>, RemoteError> {
        match self {
            RemoteSource::Disabled => Ok(None),
            RemoteSource::File(path) => {
                let path = if path.is_dir() {
                    path.join(PUBLISHED_CONFIG_PATH)
                } else {
                    path.clone()
                };
                match tokio::fs::read_to_string(&path).await {
                    Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(RemoteError::Io(path, e)),
                }
            }
            RemoteSource::Http(base) => {
                let url = Self::config_url(base, Utc::now().timestamp_millis());
                tracing::debug!(url = %url, "fetching published config");
                let response = reqwest::Client::new()
                    .get(&url)
                    .header(CACHE_CONTROL, "no-store")
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(RemoteError::Status(response.status()));
                }
                Ok(Some(response.json::<Value>().await?))
            }
        }
    }
}
