//! Local content cache for app artifacts.
//!
//! Maps a source URL to a file in the cache directory. A download is skipped
//! when a file with the derived name already exists and its length equals
//! the remote content length; otherwise the artifact is streamed to a
//! temporary file and renamed into place once complete.

mod filename;
mod http;

pub use filename::{
    derive_filename, fallback_filename, filename_from_disposition, is_servable_filename,
    FilenameClaims,
};
pub use http::HttpArtifactCache;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while caching one artifact.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Writing the cache file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Body length did not match the advertised content length.
    #[error("incomplete download: expected {expected} bytes, received {received}")]
    Incomplete { expected: u64, received: u64 },
}

/// A file in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedArtifact {
    /// Name of the file inside the cache directory.
    pub filename: String,
    /// Full path of the file.
    pub path: PathBuf,
    /// URL the artifact was finally fetched from, after redirects.
    pub resolved_url: String,
    /// Length of the file in bytes.
    pub size: u64,
    /// True when an existing file was reused without downloading.
    pub cache_hit: bool,
}

/// Trait for artifact stores.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Make sure the artifact behind `url` is cached and return it.
    ///
    /// `fallback_name` is used for the filename when neither the transfer
    /// nor the resolved URL provides one, or when that name is already
    /// claimed by another artifact in `claims`.
    async fn resolve(
        &self,
        url: &str,
        fallback_name: &str,
        claims: &FilenameClaims,
    ) -> Result<CachedArtifact, CacheError>;
}
