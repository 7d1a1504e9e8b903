//! Mock manifest fetcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogEntry, SourceManifest};
use crate::fetcher::{FetchError, ManifestFetcher};

/// Mock implementation of the ManifestFetcher trait.
///
/// Serves configured manifests per URL. Unknown URLs answer 404, URLs marked
/// as failing answer 503.
#[derive(Debug, Default)]
pub struct MockManifestFetcher {
    manifests: Arc<RwLock<HashMap<String, Vec<CatalogEntry>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<HashMap<String, usize>>>,
}

impl MockManifestFetcher {
    /// Create a new mock fetcher with no manifests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `apps` for `url`.
    pub async fn set_manifest(&self, url: &str, apps: Vec<CatalogEntry>) {
        self.manifests.write().await.insert(url.to_string(), apps);
    }

    /// Make fetches of `url` fail until [`Self::recover_source`] is called.
    pub async fn fail_source(&self, url: &str) {
        self.failing.write().await.insert(url.to_string());
    }

    pub async fn recover_source(&self, url: &str) {
        self.failing.write().await.remove(url);
    }

    /// Number of fetches attempted for `url`.
    pub async fn fetch_count(&self, url: &str) -> usize {
        self.calls.read().await.get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ManifestFetcher for MockManifestFetcher {
    async fn fetch(&self, url: &str) -> Result<SourceManifest, FetchError> {
        *self.calls.write().await.entry(url.to_string()).or_insert(0) += 1;

        if self.failing.read().await.contains(url) {
            return Err(FetchError::Status { status: 503 });
        }

        match self.manifests.read().await.get(url) {
            Some(apps) => Ok(SourceManifest {
                origin: url.to_string(),
                apps: apps.clone(),
            }),
            None => Err(FetchError::Status { status: 404 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_serves_configured_manifest() {
        let fetcher = MockManifestFetcher::new();
        fetcher
            .set_manifest(
                "https://a.example/apps.json",
                vec![fixtures::entry("Foo", "1.0", "https://a.example/foo.ipa")],
            )
            .await;

        let manifest = fetcher.fetch("https://a.example/apps.json").await.unwrap();
        assert_eq!(manifest.origin, "https://a.example/apps.json");
        assert_eq!(manifest.apps.len(), 1);
        assert_eq!(fetcher.fetch_count("https://a.example/apps.json").await, 1);
    }

    #[tokio::test]
    async fn test_failing_source_recovers() {
        let fetcher = MockManifestFetcher::new();
        fetcher.set_manifest("https://a.example/apps.json", vec![]).await;
        fetcher.fail_source("https://a.example/apps.json").await;

        let err = fetcher.fetch("https://a.example/apps.json").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503 }));

        fetcher.recover_source("https://a.example/apps.json").await;
        assert!(fetcher.fetch("https://a.example/apps.json").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_source_is_not_found() {
        let fetcher = MockManifestFetcher::new();
        let err = fetcher.fetch("https://nowhere.example/").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404 }));
    }
}
