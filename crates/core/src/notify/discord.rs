//! Discord webhook notification sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::cache::CachedArtifact;
use crate::catalog::CatalogEntry;
use crate::metrics::NOTIFICATIONS;

use super::{readable_size, NotificationSink};

const USERNAME: &str = "AltStore-Proxy";
const AVATAR_URL: &str = "https://altstore.io/images/AltStore_AppIcon.png";

/// Posts one embed per newly cached app to a Discord webhook.
pub struct DiscordWebhookSink {
    client: Client,
    webhook_url: String,
}

impl DiscordWebhookSink {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USERNAME)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    /// Webhook body for an entry; `entry.download_url` is expected to be
    /// the rewritten cache URL.
    pub fn payload(entry: &CatalogEntry, artifact: &CachedArtifact) -> Value {
        let mut embed = json!({
            "title": format!("{} v.{}", entry.name, entry.version),
            "description": entry.description().unwrap_or_default(),
            "fields": [
                {
                    "name": "Size",
                    "value": readable_size(entry.size().or(Some(artifact.size))),
                },
                {
                    "name": "Download",
                    "value": format!("[{}]({})", artifact.filename, entry.download_url),
                }
            ]
        });
        if let Some(icon) = entry.icon_url() {
            embed["thumbnail"] = json!({ "url": icon });
        }

        json!({
            "username": USERNAME,
            "avatar_url": AVATAR_URL,
            "embeds": [embed],
        })
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhookSink {
    async fn notify(&self, entry: &CatalogEntry, artifact: &CachedArtifact) {
        let payload = Self::payload(entry, artifact);

        match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => {
                debug!(app = %entry.name, "Notification sent to Discord");
                NOTIFICATIONS.with_label_values(&["sent"]).inc();
            }
            Ok(response) => {
                warn!(
                    app = %entry.name,
                    "Could not send to Discord - HTTP {}",
                    response.status().as_u16()
                );
                NOTIFICATIONS.with_label_values(&["failed"]).inc();
            }
            Err(e) => {
                warn!(app = %entry.name, "Could not send to Discord - {}", e);
                NOTIFICATIONS.with_label_values(&["failed"]).inc();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use std::path::PathBuf;

    #[test]
    fn test_payload_shape() {
        let mut entry = fixtures::entry("Winston", "1.2.0", "http://host/cache/Winston.ipa");
        entry.extra.insert("size".to_string(), json!(1536));
        entry
            .extra
            .insert("localizedDescription".to_string(), json!("A Reddit client"));
        entry
            .extra
            .insert("iconURL".to_string(), json!("https://example.com/icon.png"));

        let artifact = CachedArtifact {
            filename: "Winston.ipa".to_string(),
            path: PathBuf::from("/cache/Winston.ipa"),
            resolved_url: "https://cdn.example/Winston.ipa".to_string(),
            size: 1536,
            cache_hit: false,
        };

        let payload = DiscordWebhookSink::payload(&entry, &artifact);
        assert_eq!(payload["username"], "AltStore-Proxy");

        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Winston v.1.2.0");
        assert_eq!(embed["description"], "A Reddit client");
        assert_eq!(embed["thumbnail"]["url"], "https://example.com/icon.png");
        assert_eq!(embed["fields"][0]["value"], "1.5 KB");
        assert_eq!(
            embed["fields"][1]["value"],
            "[Winston.ipa](http://host/cache/Winston.ipa)"
        );
    }

    #[test]
    fn test_payload_falls_back_to_cached_size() {
        let entry = fixtures::entry("Foo", "1.0", "http://host/cache/foo.ipa");
        let artifact = CachedArtifact {
            filename: "foo.ipa".to_string(),
            path: PathBuf::from("/cache/foo.ipa"),
            resolved_url: "https://cdn.example/foo.ipa".to_string(),
            size: 2048,
            cache_hit: false,
        };

        let payload = DiscordWebhookSink::payload(&entry, &artifact);
        let embed = &payload["embeds"][0];
        assert_eq!(embed["fields"][0]["value"], "2 KB");
        assert_eq!(embed["description"], "");
        assert!(embed.get("thumbnail").is_none());
    }
}
