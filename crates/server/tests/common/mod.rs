//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the real router around a
//! catalog state the test controls, with a temporary cache directory.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use altproxy_core::{CatalogEntry, CatalogMerger, CatalogState, Config, PublishedCatalog};

/// Re-export fixtures for test convenience
pub use altproxy_core::testing::fixtures;

pub const BASE_URL: &str = "http://proxy.test:8080";

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_apps_json() {
///     let fixture = TestFixture::new();
///     fixture.publish(vec![fixtures::entry("Foo", "1.0", "http://proxy.test:8080/cache/Foo.ipa")]).await;
///
///     let response = fixture.get("/apps.json").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Catalog state shared with the router
    pub catalog: Arc<CatalogState>,
    /// Cache directory the router serves from
    pub cache_dir: TempDir,
    merger: CatalogMerger,
    cycles: std::sync::atomic::AtomicU64,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let cache_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.cache.dir = cache_dir.path().to_path_buf();
        config.server.base_url = Some(BASE_URL.to_string());
        config.notifications.discord_webhook =
            Some("https://discord.com/api/webhooks/1/secret-token".to_string());

        let catalog = Arc::new(CatalogState::new());
        let merger = CatalogMerger::new(config.catalog.clone(), BASE_URL);
        let state = Arc::new(altproxy_server::state::AppState::new(
            config,
            BASE_URL.to_string(),
            Arc::clone(&catalog),
        ));
        let router = altproxy_server::api::create_router(state);

        Self {
            router,
            catalog,
            cache_dir,
            merger,
            cycles: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Publish a catalog holding `apps` as the next cycle.
    pub async fn publish(&self, apps: Vec<CatalogEntry>) {
        let cycle = self
            .cycles
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        let catalog = self
            .merger
            .merge(vec![fixtures::manifest("https://a.example/apps.json", apps)]);
        self.catalog
            .publish(PublishedCatalog {
                catalog,
                cycle,
                sources: 1,
                published_at: Utc::now(),
            })
            .await;
    }

    /// Write a file into the cache directory.
    pub fn write_cached(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.cache_dir.path().join(name), contents).unwrap();
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes: body_bytes.to_vec(),
            body,
        }
    }
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
