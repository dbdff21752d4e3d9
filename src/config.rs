use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::{LocalStorage, RemoteSource};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// CLI settings with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// The storefront page the editor works on
    pub page: ConfigValue<PathBuf>,
    /// Directory holding the persisted edits and credentials
    pub storage_dir: ConfigValue<PathBuf>,
    /// Base URL or directory of the published config (defaults to the page's directory)
    pub site_url: ConfigValue<Option<String>>,
    /// Publish relay endpoint
    pub relay_url: ConfigValue<Option<String>>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing the settings file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SettingsFile {
    page: Option<PathBuf>,
    storage_dir: Option<PathBuf>,
    site_url: Option<String>,
    relay_url: Option<String>,
}

/// Resolves relative paths against the settings file's directory
fn resolve(file: &Path, value: PathBuf) -> PathBuf {
    if value.is_relative() {
        file.parent().map(|p| p.join(&value)).unwrap_or(value)
    } else {
        value
    }
}

impl Settings {
    /// Load settings with priority: env vars > settings file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, SettingsError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`Settings::load`] with an explicit environment lookup.
    pub fn load_with(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let mut page = ConfigValue::new(PathBuf::from("index.html"), ConfigSource::Default);
        let mut storage_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut site_url = ConfigValue::new(None, ConfigSource::Default);
        let mut relay_url = ConfigValue::new(None, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from settings file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| SettingsError::ReadError(path.clone(), e))?;
            let file: SettingsFile = serde_yaml::from_str(&contents)
                .map_err(|e| SettingsError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(value) = file.page {
                page = ConfigValue::new(resolve(&path, value), ConfigSource::File);
            }
            if let Some(value) = file.storage_dir {
                storage_dir = ConfigValue::new(resolve(&path, value), ConfigSource::File);
            }
            if let Some(value) = file.site_url {
                site_url = ConfigValue::new(Some(value), ConfigSource::File);
            }
            if let Some(value) = file.relay_url {
                relay_url = ConfigValue::new(Some(value), ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Some(value) = env("STOREFRONT_PAGE") {
            page = ConfigValue::new(PathBuf::from(value), ConfigSource::Environment);
        }
        if let Some(value) = env("STOREFRONT_STORAGE_DIR") {
            storage_dir = ConfigValue::new(PathBuf::from(value), ConfigSource::Environment);
        }
        if let Some(value) = env("STOREFRONT_SITE_URL") {
            site_url = ConfigValue::new(Some(value), ConfigSource::Environment);
        }
        if let Some(value) = env("STOREFRONT_RELAY_URL") {
            relay_url = ConfigValue::new(Some(value), ConfigSource::Environment);
        }

        Ok(Self {
            page,
            storage_dir,
            site_url,
            relay_url,
            config_file,
        })
    }

    /// Where the published config is read from.
    pub fn remote_source(&self) -> RemoteSource {
        match &self.site_url.value {
            Some(location) => RemoteSource::from_location(location),
            None => {
                let dir = self
                    .page
                    .value
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                RemoteSource::File(dir.to_path_buf())
            }
        }
    }

    pub fn local_storage(&self) -> LocalStorage {
        LocalStorage::new(self.storage_dir.value.clone())
    }

    /// Default config directory (platform-specific), e.g. ~/.config/storefront/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storefront")
    }

    /// Default data directory (platform-specific), e.g. ~/.local/share/storefront/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storefront")
    }

    /// Default settings file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
}
