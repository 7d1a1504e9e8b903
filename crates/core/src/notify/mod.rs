//! Notifications about newly cached apps.
//!
//! A sink is invoked once per entry whose artifact was freshly downloaded in
//! a cycle, after its URL has been rewritten. Sinks return nothing: delivery
//! failures are logged inside the sink and never reach the refresh cycle.

mod discord;

pub use discord::DiscordWebhookSink;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::cache::CachedArtifact;
use crate::catalog::CatalogEntry;
use crate::config::NotificationConfig;

/// Trait for notification sinks.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Announce a newly cached entry.
    async fn notify(&self, entry: &CatalogEntry, artifact: &CachedArtifact);
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl NotificationSink for NoopSink {
    async fn notify(&self, _entry: &CatalogEntry, _artifact: &CachedArtifact) {}
}

/// Create the sink described by the configuration.
pub fn create_sink(config: &NotificationConfig) -> Arc<dyn NotificationSink> {
    match config.discord_webhook.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => match DiscordWebhookSink::new(url) {
            Ok(sink) => {
                info!("Discord notifications enabled");
                Arc::new(sink)
            }
            Err(e) => {
                warn!("Failed to create Discord sink, notifications disabled: {}", e);
                Arc::new(NoopSink)
            }
        },
        None => Arc::new(NoopSink),
    }
}

/// Human readable byte count using 1024-based units, e.g. `15.5 MB`.
///
/// Unknown or zero sizes render as an empty string.
pub fn readable_size(size: Option<u64>) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let Some(bytes) = size.filter(|b| *b > 0) else {
        return String::new();
    };

    let mut value = bytes as f64;
    let mut unit = 0;
    while value > 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
