//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the network-facing seams of the refresh cycle so the
//! cycle can be exercised without remote sources.
//!
//! # Example
//!
//! ```rust,ignore
//! use altproxy_core::testing::{fixtures, MockArtifactStore, MockManifestFetcher};
//!
//! let fetcher = MockManifestFetcher::new();
//! fetcher
//!     .set_manifest("https://a.example/apps.json", vec![fixtures::entry("Foo", "1.0", "https://a.example/foo.ipa")])
//!     .await;
//!
//! let cache = MockArtifactStore::new();
//! cache.fail_url("https://a.example/foo.ipa").await;
//! ```

mod mock_artifact_store;
mod mock_fetcher;
mod recording_sink;

pub use mock_artifact_store::MockArtifactStore;
pub use mock_fetcher::MockManifestFetcher;
pub use recording_sink::RecordingSink;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::Map;

    use crate::catalog::{CatalogEntry, SourceManifest};

    /// Create a catalog entry with only the required fields set.
    pub fn entry(name: &str, version: &str, download_url: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            version: version.to_string(),
            download_url: download_url.to_string(),
            extra: Map::new(),
        }
    }

    /// Create a manifest as fetched from `origin`.
    pub fn manifest(origin: &str, apps: Vec<CatalogEntry>) -> SourceManifest {
        SourceManifest {
            origin: origin.to_string(),
            apps,
        }
    }
}
