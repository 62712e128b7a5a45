use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "https://public-api.timeweb.com";
pub const API_URL_ENV: &str = "TWVDS_API_URL";

/// Upper bound on any single HTTP request to the provider.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 300;

/// Represents the configuration file stored in `~/.config/twvds/config.json`.
///
/// Keys this version does not know about are carried through `extra` so that
/// rewriting the file never drops them.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ApiSection {
    /// The encoded `login:password` credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Base URL override for the provider API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct PollSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    /// `0` disables the timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Base URL for API calls: environment, then config file, then the public endpoint.
    pub fn api_url(&self) -> Result<String, AppError> {
        resolve_api_url(std::env::var(API_URL_ENV).ok(), self)
    }

    pub fn poll_interval(&self) -> Duration {
        let ms = self
            .poll
            .as_ref()
            .and_then(|p| p.interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    /// `None` means polling is unbounded.
    pub fn poll_timeout(&self) -> Option<Duration> {
        let secs = self
            .poll
            .as_ref()
            .and_then(|p| p.timeout_secs)
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);
        (secs > 0).then(|| Duration::from_secs(secs))
    }
}

fn resolve_api_url(env_url: Option<String>, config: &AppConfig) -> Result<String, AppError> {
    let non_empty = |url: &String| !url.trim().is_empty();
    let url = env_url
        .filter(non_empty)
        .or_else(|| {
            config
                .api
                .as_ref()
                .and_then(|api| api.url.clone())
                .filter(non_empty)
        })
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Config(format!(
            "API URL '{url}' must start with http:// or https://"
        )));
    }
    Ok(url.to_string())
}

/// The persisted credential: base64 of `login:password`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn encode(login: &str, password: &str) -> Self {
        Self(general_purpose::STANDARD.encode(format!("{login}:{password}")))
    }

    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Trait for configuration operations to enable dependency injection
#[async_trait]
pub trait ConfigOperations: Send + Sync {
    async fn load_config(&self) -> Result<AppConfig>;
    async fn save_config(&self, config: &AppConfig) -> Result<()>;
}

/// A JSON configuration file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// `~/.config/twvds/config.json`
    pub fn default_location() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to find home directory")?;
        Ok(Self::at(&home_dir))
    }

    /// The config file under an arbitrary home directory.
    pub fn at(home: &Path) -> Self {
        Self {
            path: home.join(".config").join("twvds").join("config.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigOperations for ConfigFile {
    /// If the config file doesn't exist, returns a default, empty config.
    async fn load_config(&self) -> Result<AppConfig> {
        let config_path = &self.path;
        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(config_path)
            .await
            .with_context(|| format!("Failed to read config file at {config_path:?}"))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {config_path:?}"))?;

        Ok(config)
    }

    /// Creates the necessary directory and file if they don't exist.
    async fn save_config(&self, config: &AppConfig) -> Result<()> {
        let config_path = &self.path;
        let config_dir = config_path.parent().unwrap_or_else(|| Path::new(""));

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .await
                .with_context(|| format!("Failed to create config directory at {config_dir:?}"))?;
        }

        let content = serde_json::to_string_pretty(config)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(config_path, content)
            .await
            .with_context(|| format!("Failed to write config file to {config_path:?}"))?;

        Ok(())
    }
}

/// Reads the stored credential. A missing file or key is `None`, not an error.
pub async fn load_secret<C: ConfigOperations + ?Sized>(config_ops: &C) -> Result<Option<Secret>> {
    let config = config_ops.load_config().await?;
    Ok(config
        .api
        .and_then(|api| api.key)
        .filter(|key| !key.is_empty())
        .map(Secret::from_stored))
}

/// Stores the credential, overwriting any previous one and leaving other keys alone.
pub async fn save_secret<C: ConfigOperations + ?Sized>(config_ops: &C, secret: &Secret) -> Result<()> {
    let mut config = config_ops.load_config().await?;
    config.api.get_or_insert_with(ApiSection::default).key = Some(secret.as_str().to_string());
    config_ops.save_config(&config).await
}

/// Removes the stored credential. Returns whether there was one.
pub async fn clear_secret<C: ConfigOperations + ?Sized>(config_ops: &C) -> Result<bool> {
    let mut config = config_ops.load_config().await?;
    let removed = config.api.as_mut().and_then(|api| api.key.take()).is_some();
    if removed {
        config_ops.save_config(&config).await?;
    }
    Ok(removed)
}
