use std::path::Path;

use super::{types::Config, ConfigError};

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Normalize the public base URL: trailing slashes are stripped, the result
/// must be non-empty and use an http(s) scheme.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');

    if trimmed.is_empty() {
        return Err(ConfigError::ValidationError(
            "server.base_url must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(ConfigError::ValidationError(format!(
            "server.base_url must start with http:// or https:// (got {})",
            trimmed
        )));
    }

    Ok(trimmed.to_string())
}

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Base URL normalizes to a non-empty http(s) URL
/// - At least one source, all of them http(s) URLs
/// - Refresh interval is not 0
/// - Discord webhook, if set, is an http(s) URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }
    config.public_base_url()?;

    // Cache validation
    if config.cache.extension.trim_start_matches('.').is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.extension cannot be empty".to_string(),
        ));
    }

    // Refresh validation
    if config.refresh.sources.is_empty() {
        return Err(ConfigError::ValidationError(
            "refresh.sources must list at least one manifest URL".to_string(),
        ));
    }
    if let Some(bad) = config.refresh.sources.iter().find(|s| !is_http_url(s)) {
        return Err(ConfigError::ValidationError(format!(
            "refresh.sources entry is not an http(s) URL: {}",
            bad
        )));
    }
    if config.refresh.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "refresh.interval_secs cannot be 0".to_string(),
        ));
    }

    if let Some(webhook) = &config.notifications.discord_webhook {
        if !is_http_url(webhook) {
            return Err(ConfigError::ValidationError(
                "notifications.discord_webhook must be an http(s) URL".to_string(),
            ));
        }
    }

    Ok(())
}

/// Create the cache directory if it does not exist yet.
pub fn prepare_cache_dir(dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ConfigError::ValidationError(format!(
            "cannot create cache directory {}: {}",
            dir.display(),
            e
        ))
    })
}
