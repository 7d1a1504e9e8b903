use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::refresh::RefreshConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub catalog: CatalogMetadata,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    /// Public base URL used to build cache download links.
    ///
    /// Falls back to the loopback address on the configured port and strips
    /// trailing slashes.
    pub fn public_base_url(&self) -> Result<String, super::ConfigError> {
        let raw = match &self.server.base_url {
            Some(url) => url.clone(),
            None => format!("http://127.0.0.1:{}", self.server.port),
        };
        super::normalize_base_url(&raw)
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable URL of this proxy (for reverse proxy usage).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Artifact cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Extension every cached artifact name must carry (without the dot).
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Longest pause between two reads of an artifact download, in seconds.
    /// The transfer as a whole is not bounded.
    #[serde(default = "default_read_timeout", alias = "request_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            extension: default_extension(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_extension() -> String {
    "ipa".to_string()
}

fn default_read_timeout() -> u64 {
    120
}

/// Static top-level metadata of the merged catalog document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CatalogMetadata {
    #[serde(default = "default_catalog_name")]
    pub name: String,
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
    #[serde(default = "default_icon_url")]
    pub icon_url: String,
    #[serde(default = "default_website")]
    pub website: String,
}

impl Default for CatalogMetadata {
    fn default() -> Self {
        Self {
            name: default_catalog_name(),
            subtitle: default_subtitle(),
            icon_url: default_icon_url(),
            website: default_website(),
        }
    }
}

fn default_catalog_name() -> String {
    "AltStore-Proxy".to_string()
}

fn default_subtitle() -> String {
    "A simple proxy for slow AltStore servers.".to_string()
}

fn default_icon_url() -> String {
    "https://altstore.io/images/AltStore_AppIcon.png".to_string()
}

fn default_website() -> String {
    "https://github.com/rix1337/AltStore-Proxy".to_string()
}

/// Notification configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// Discord webhook receiving one message per newly cached app.
    #[serde(default)]
    pub discord_webhook: Option<String>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub catalog: CatalogMetadata,
    pub notifications: SanitizedNotificationConfig,
}

/// Sanitized notification config (webhook URL hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotificationConfig {
    pub discord_webhook_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            cache: config.cache.clone(),
            refresh: config.refresh.clone(),
            catalog: config.catalog.clone(),
            notifications: SanitizedNotificationConfig {
                discord_webhook_configured: config
                    .notifications
                    .discord_webhook
                    .as_deref()
                    .is_some_and(|url| !url.is_empty()),
            },
        }
    }
}
