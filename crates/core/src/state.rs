//! Shared catalog state between the refresh scheduler and HTTP readers.
//!
//! One writer (the scheduler, one cycle at a time) and any number of readers.
//! Publishing swaps a single `Arc` under the write lock, so a reader sees
//! either the previous catalog or the new one in full.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, RwLock};

use crate::catalog::MergedCatalog;

/// A merged catalog together with the cycle that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedCatalog {
    pub catalog: MergedCatalog,
    /// Sequence number of the producing cycle, starting at 1.
    pub cycle: u64,
    /// Number of sources whose entries made it into the catalog.
    pub sources: usize,
    pub published_at: DateTime<Utc>,
}

/// Last successfully published catalog plus readiness.
#[derive(Debug)]
pub struct CatalogState {
    current: RwLock<Option<Arc<PublishedCatalog>>>,
    ready: watch::Sender<bool>,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogState {
    /// Empty, not-ready state.
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            current: RwLock::new(None),
            ready,
        }
    }

    /// Current catalog (absent before the first publish) and readiness.
    pub async fn get(&self) -> (Option<Arc<PublishedCatalog>>, bool) {
        let current = self.current.read().await.clone();
        let ready = current.is_some();
        (current, ready)
    }

    /// Current catalog, if any.
    pub async fn current(&self) -> Option<Arc<PublishedCatalog>> {
        self.current.read().await.clone()
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Replace the current catalog and mark the state ready.
    pub async fn publish(&self, published: PublishedCatalog) {
        let published = Arc::new(published);
        {
            let mut current = self.current.write().await;
            *current = Some(published);
        }
        self.ready.send_replace(true);
    }

    /// Resolves once the first catalog has been published.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`, so this only ends on readiness.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogMetadata;
    use crate::catalog::CatalogMerger;
    use crate::testing::fixtures;
    use std::time::Duration;

    fn published(cycle: u64, apps: usize) -> PublishedCatalog {
        let merger = CatalogMerger::new(CatalogMetadata::default(), "http://host");
        let manifest = fixtures::manifest(
            "https://a.example/apps.json",
            (0..apps)
                .map(|i| fixtures::entry(&format!("App{}", i), "1.0", "https://a.example/x.ipa"))
                .collect(),
        );
        PublishedCatalog {
            catalog: merger.merge(vec![manifest]),
            cycle,
            sources: 1,
            published_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_new_state_is_not_ready() {
        let state = CatalogState::new();
        let (catalog, ready) = state.get().await;
        assert!(catalog.is_none());
        assert!(!ready);
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn test_publish_makes_ready_and_replaces() {
        let state = CatalogState::new();

        state.publish(published(1, 1)).await;
        let (catalog, ready) = state.get().await;
        assert!(ready);
        assert!(state.is_ready());
        assert_eq!(catalog.unwrap().cycle, 1);

        state.publish(published(2, 3)).await;
        let current = state.current().await.unwrap();
        assert_eq!(current.cycle, 2);
        assert_eq!(current.catalog.apps.len(), 3);
    }

    #[tokio::test]
    async fn test_readers_keep_their_snapshot() {
        let state = CatalogState::new();
        state.publish(published(1, 1)).await;

        let held = state.current().await.unwrap();
        state.publish(published(2, 5)).await;

        // a reader holding the old Arc is unaffected by the swap
        assert_eq!(held.cycle, 1);
        assert_eq!(held.catalog.apps.len(), 1);
    }

    #[tokio::test]
    async fn test_wait_ready_resolves_after_publish() {
        let state = Arc::new(CatalogState::new());

        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.wait_ready().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        state.publish(published(1, 1)).await;
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_ready did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_ready_when_already_ready() {
        let state = CatalogState::new();
        state.publish(published(1, 0)).await;
        tokio::time::timeout(Duration::from_secs(1), state.wait_ready())
            .await
            .expect("wait_ready did not resolve");
    }
}
