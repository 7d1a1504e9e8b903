//! reqwest-backed artifact cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Response};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::metrics::ARTIFACT_BYTES_DOWNLOADED;

use super::filename::{derive_filename, FilenameClaims};
use super::{ArtifactStore, CacheError, CachedArtifact};

/// Write buffer for streamed downloads.
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Time allowed to establish a connection to an artifact host.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Artifact cache that downloads over HTTP(S) into a local directory.
pub struct HttpArtifactCache {
    client: Client,
    dir: PathBuf,
    extension: String,
}

impl HttpArtifactCache {
    /// Create a cache rooted at `dir`.
    ///
    /// A download fails once the host sends nothing for `read_timeout`; a
    /// slow but steady transfer may take as long as it needs.
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        read_timeout: Duration,
    ) -> Result<Self, CacheError> {
        let client = Client::builder()
            .user_agent(concat!("AltStore-Proxy/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(read_timeout)
            .build()?;

        Ok(Self::with_client(client, dir, extension))
    }

    /// Create a cache around an existing client.
    pub fn with_client(client: Client, dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            client,
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Temporary path a download is written to before being renamed.
    fn partial_path(&self, filename: &str) -> PathBuf {
        self.dir.join(format!(".{}.part", filename))
    }

    /// Existing file whose length matches the remote length, if any.
    ///
    /// An unknown or zero remote length never matches.
    async fn reusable(&self, path: &Path, remote_len: Option<u64>) -> Option<u64> {
        let expected = remote_len.filter(|len| *len > 0)?;
        let metadata = fs::metadata(path).await.ok()?;
        (metadata.is_file() && metadata.len() == expected).then_some(expected)
    }

    /// Stream the body into the temp file, then rename it into place.
    async fn download(
        &self,
        response: Response,
        filename: &str,
        expected: Option<u64>,
    ) -> Result<u64, CacheError> {
        let partial = self.partial_path(filename);
        let target = self.dir.join(filename);

        match write_body(response, &partial, expected).await {
            Ok(written) => {
                if let Err(e) = fs::rename(&partial, &target).await {
                    let _ = fs::remove_file(&partial).await;
                    return Err(e.into());
                }
                Ok(written)
            }
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}

async fn write_body(
    mut response: Response,
    path: &Path,
    expected: Option<u64>,
) -> Result<u64, CacheError> {
    let file = File::create(path).await?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

    let total = expected.filter(|len| *len > 0);
    let mut written = 0u64;
    let mut next_report = 10u64;

    while let Some(chunk) = response.chunk().await? {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
        ARTIFACT_BYTES_DOWNLOADED.inc_by(chunk.len() as u64);

        if let Some(total) = total {
            let pct = written * 100 / total;
            if pct >= next_report {
                debug!(path = %path.display(), "Download {}% ({}/{} bytes)", pct, written, total);
                next_report = (pct / 10 + 1) * 10;
            }
        }
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    if let Some(total) = total {
        if written != total {
            return Err(CacheError::Incomplete {
                expected: total,
                received: written,
            });
        }
    }

    Ok(written)
}

#[async_trait]
impl ArtifactStore for HttpArtifactCache {
    async fn resolve(
        &self,
        url: &str,
        fallback_name: &str,
        claims: &FilenameClaims,
    ) -> Result<CachedArtifact, CacheError> {
        // Redirects are followed; the body stays unread until after the hit check.
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let resolved = response.url().clone();
        if resolved.as_str() != url {
            debug!(url, resolved = %resolved, "Resolved redirect");
        }

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let remote_len = response.content_length();

        let derived = derive_filename(
            disposition.as_deref(),
            &resolved,
            fallback_name,
            &self.extension,
        );
        let filename = claims.pick(
            derived.clone(),
            fallback_name,
            &self.extension,
            resolved.as_str(),
        );
        if filename != derived {
            info!(
                owner = claims.owner(&derived).unwrap_or_default(),
                "{} is taken by another artifact this cycle, caching as {}",
                derived,
                filename
            );
        }
        let path = self.dir.join(&filename);

        if let Some(size) = self.reusable(&path, remote_len).await {
            info!("File {} already exists with the same size, skipping download", filename);
            drop(response);
            return Ok(CachedArtifact {
                filename,
                path,
                resolved_url: resolved.to_string(),
                size,
                cache_hit: true,
            });
        }

        info!("Downloading {} to {}", resolved, path.display());
        let size = self.download(response, &filename, remote_len).await?;

        Ok(CachedArtifact {
            filename,
            path,
            resolved_url: resolved.to_string(),
            size,
            cache_hit: false,
        })
    }
}
