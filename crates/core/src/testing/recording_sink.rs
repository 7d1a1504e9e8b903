//! Notification sink that records what it was given.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::CachedArtifact;
use crate::catalog::CatalogEntry;
use crate::notify::NotificationSink;

/// Records every notification for test assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    notifications: Arc<RwLock<Vec<(CatalogEntry, CachedArtifact)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded notifications, oldest first.
    pub async fn notifications(&self) -> Vec<(CatalogEntry, CachedArtifact)> {
        self.notifications.read().await.clone()
    }

    /// Names of the notified entries, oldest first.
    pub async fn notified_names(&self) -> Vec<String> {
        self.notifications
            .read()
            .await
            .iter()
            .map(|(entry, _)| entry.name.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, entry: &CatalogEntry, artifact: &CachedArtifact) {
        self.notifications
            .write()
            .await
            .push((entry.clone(), artifact.clone()));
    }
}
