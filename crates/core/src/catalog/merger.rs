//! Assembles per-source manifests into the merged catalog.

use crate::cache::CachedArtifact;
use crate::config::CatalogMetadata;

use super::types::{CatalogEntry, MergedCatalog, SourceManifest};

/// Builds merged catalogs and rewrites download URLs to the local cache.
#[derive(Debug, Clone)]
pub struct CatalogMerger {
    metadata: CatalogMetadata,
    base_url: String,
}

impl CatalogMerger {
    /// `base_url` is the normalized public URL of this proxy.
    pub fn new(metadata: CatalogMetadata, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { metadata, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL of a cached file: `<base>/cache/<filename>`.
    pub fn cache_url(&self, filename: &str) -> String {
        format!("{}/cache/{}", self.base_url, urlencoding::encode(filename))
    }

    /// Point an entry at its cached artifact.
    pub fn rewrite(&self, mut entry: CatalogEntry, artifact: &CachedArtifact) -> CatalogEntry {
        entry.download_url = self.cache_url(&artifact.filename);
        entry
    }

    /// Concatenate sources in order, keeping each source's entry order.
    /// No sorting and no deduplication.
    pub fn merge(&self, sources: Vec<SourceManifest>) -> MergedCatalog {
        let apps = sources.into_iter().flat_map(|source| source.apps).collect();

        MergedCatalog {
            name: self.metadata.name.clone(),
            subtitle: self.metadata.subtitle.clone(),
            icon_url: self.metadata.icon_url.clone(),
            website: self.metadata.website.clone(),
            apps,
            news: Vec::new(),
        }
    }
}
