//! Retrieval of remote source manifests.
//!
//! A fetch either yields a parsed [`SourceManifest`] or a [`FetchError`].
//! There is no retry within a cycle; the next scheduled cycle retries.

mod http;

pub use http::HttpManifestFetcher;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::SourceManifest;

/// Errors that can occur while fetching one manifest.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, timeout, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Source answered with a non-success status.
    #[error("source returned HTTP {status}")]
    Status { status: u16 },

    /// Body was not a manifest document.
    #[error("failed to parse manifest: {0}")]
    Parse(String),
}

/// Trait for manifest sources.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetch and parse the manifest published at `url`.
    async fn fetch(&self, url: &str) -> Result<SourceManifest, FetchError>;
}
