//! reqwest-backed manifest fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::catalog::{ManifestDocument, SourceManifest};

use super::{FetchError, ManifestFetcher};

/// Fetches manifests over HTTP(S).
pub struct HttpManifestFetcher {
    client: Client,
}

impl HttpManifestFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("AltStore-Proxy/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url: &str) -> Result<SourceManifest, FetchError> {
        debug!(source = url, "Fetching manifest");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let document: ManifestDocument =
            serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        debug!(source = url, apps = document.apps.len(), "Parsed manifest");

        Ok(SourceManifest {
            origin: url.to_string(),
            apps: document.apps,
        })
    }
}
