//! Mock artifact store for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::{ArtifactStore, CacheError, CachedArtifact, FilenameClaims};

const DEFAULT_SIZE: u64 = 1024;

/// Mock implementation of the ArtifactStore trait.
///
/// Keeps an in-memory set of cached URLs. The first resolve of a URL counts
/// as a download, later ones are cache hits. The filename is the last path
/// segment of the URL, or the fallback name plus `.ipa`, and honors the
/// claims of the current cycle.
#[derive(Debug, Default)]
pub struct MockArtifactStore {
    cached: Arc<RwLock<HashMap<String, CachedArtifact>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    downloads: Arc<RwLock<Vec<String>>>,
}

impl MockArtifactStore {
    /// Create a new empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make resolves of `url` fail with HTTP 500.
    pub async fn fail_url(&self, url: &str) {
        self.failing.write().await.insert(url.to_string());
    }

    /// Forget a cached URL so the next resolve downloads again.
    pub async fn evict(&self, url: &str) {
        self.cached.write().await.remove(url);
    }

    /// URLs downloaded so far, in order.
    pub async fn downloads(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }

    pub async fn download_count(&self) -> usize {
        self.downloads.read().await.len()
    }

    fn filename(url: &str, fallback_name: &str) -> String {
        url.split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|segment| !segment.is_empty() && segment.contains('.'))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.ipa", fallback_name))
    }
}

#[async_trait]
impl ArtifactStore for MockArtifactStore {
    async fn resolve(
        &self,
        url: &str,
        fallback_name: &str,
        claims: &FilenameClaims,
    ) -> Result<CachedArtifact, CacheError> {
        if self.failing.read().await.contains(url) {
            return Err(CacheError::Status {
                status: 500,
                url: url.to_string(),
            });
        }

        let mut cached = self.cached.write().await;
        if let Some(existing) = cached.get(url) {
            return Ok(CachedArtifact {
                cache_hit: true,
                ..existing.clone()
            });
        }

        let filename = claims.pick(Self::filename(url, fallback_name), fallback_name, "ipa", url);
        let artifact = CachedArtifact {
            path: PathBuf::from("/cache").join(&filename),
            filename,
            resolved_url: url.to_string(),
            size: DEFAULT_SIZE,
            cache_hit: false,
        };
        cached.insert(url.to_string(), artifact.clone());
        self.downloads.write().await.push(url.to_string());

        Ok(artifact)
    }
}
