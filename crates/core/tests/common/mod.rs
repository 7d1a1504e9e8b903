//! Local upstream stub shared by the integration tests.
//!
//! Binds an axum server on an ephemeral loopback port and serves whatever
//! routes a test registers: JSON manifests, binary artifacts, redirects and
//! error statuses. Every request is counted per path.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Router;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

#[derive(Clone)]
enum Route {
    Json(Value),
    File {
        body: Bytes,
        disposition: Option<String>,
    },
    Redirect(String),
    Status(StatusCode),
}

#[derive(Default)]
struct StubState {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// A running upstream stub.
pub struct StubServer {
    base: String,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .fallback(serve)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            state,
        }
    }

    /// Absolute URL of `path` on this stub.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn set_json(&self, path: &str, value: Value) {
        self.insert(path, Route::Json(value));
    }

    pub fn set_file(&self, path: &str, body: impl Into<Bytes>) {
        self.insert(
            path,
            Route::File {
                body: body.into(),
                disposition: None,
            },
        );
    }

    pub fn set_file_with_disposition(&self, path: &str, body: impl Into<Bytes>, disposition: &str) {
        self.insert(
            path,
            Route::File {
                body: body.into(),
                disposition: Some(disposition.to_string()),
            },
        );
    }

    /// Redirect `path` to `target`, another path on this stub.
    pub fn set_redirect(&self, path: &str, target: &str) {
        self.insert(path, Route::Redirect(self.url(target)));
    }

    pub fn set_status(&self, path: &str, status: StatusCode) {
        self.insert(path, Route::Status(status));
    }

    /// Requests received for `path` so far.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    fn insert(&self, path: &str, route: Route) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), route);
    }
}

async fn serve(State(state): State<Arc<StubState>>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    *state.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    let route = state.routes.lock().unwrap().get(&path).cloned();
    match route {
        Some(Route::Json(value)) => axum::Json(value).into_response(),
        Some(Route::File { body, disposition }) => {
            let mut response = body.into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                "application/octet-stream".parse().unwrap(),
            );
            if let Some(disposition) = disposition {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, disposition.parse().unwrap());
            }
            response
        }
        Some(Route::Redirect(target)) => Redirect::temporary(&target).into_response(),
        Some(Route::Status(status)) => status.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Start a raw server that advertises `advertised` bytes but sends only
/// `body` before closing the connection. Returns the URL of `path`.
pub async fn truncating_server(path: &str, advertised: usize, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await;

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                advertised
            );
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(body).await;
            let _ = stream.shutdown().await;
        }
    });

    format!("http://{}{}", addr, path)
}

/// Start a raw server that sends `chunks` with `gap` between them, after
/// advertising their total length. Returns the URL of `path`.
pub async fn trickling_server(
    path: &str,
    chunks: Vec<&'static [u8]>,
    gap: std::time::Duration,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let total: usize = chunks.iter().map(|c| c.len()).sum();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let chunks = chunks.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await;

                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    total
                );
                let _ = stream.write_all(head.as_bytes()).await;
                for (i, chunk) in chunks.iter().enumerate() {
                    if i > 0 {
                        tokio::time::sleep(gap).await;
                    }
                    if stream.write_all(chunk).await.is_err() {
                        return;
                    }
                    let _ = stream.flush().await;
                }
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{}{}", addr, path)
}

/// A manifest document with one app per `(name, version, download_url)`.
pub fn manifest(apps: &[(&str, &str, &str)]) -> Value {
    let apps: Vec<Value> = apps
        .iter()
        .map(|(name, version, url)| {
            serde_json::json!({
                "name": name,
                "bundleIdentifier": format!("com.example.{}", name.to_lowercase()),
                "version": version,
                "downloadURL": url,
                "localizedDescription": format!("{} description", name),
            })
        })
        .collect();

    serde_json::json!({
        "name": "Upstream",
        "identifier": "com.example.upstream",
        "apps": apps,
        "news": [],
    })
}

/// Names of the regular files in `dir`, sorted.
pub fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
