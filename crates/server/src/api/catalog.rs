//! Catalog API handlers: the merged catalog and cached artifacts.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use altproxy_core::cache::is_servable_filename;

use crate::state::AppState;

/// Body of the 503 answer before the first publish.
pub const NOT_READY_MESSAGE: &str = "Cache not initialized. Please try again later.";

/// Seconds a client should wait before asking again while not ready.
const RETRY_AFTER_SECS: &str = "60";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /apps.json
///
/// The last published catalog, or 503 before the first cycle published.
pub async fn apps_json(State(state): State<Arc<AppState>>) -> Response {
    match state.catalog().current().await {
        Some(published) => Json(&published.catalog).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
            Json(ErrorResponse {
                error: NOT_READY_MESSAGE.to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /cache/{filename}
///
/// Streams a cached artifact as a binary attachment.
pub async fn cache_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    request: Request,
) -> Response {
    if !is_servable_filename(&filename) {
        debug!(filename = %filename, "Rejected cache filename");
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = state.cache_dir().join(&filename);
    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return StatusCode::NOT_FOUND.into_response();
    }

    let response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let mut response = response.map(Body::new);
    if response.status().is_success() {
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        if let Some(disposition) = attachment_disposition(&filename) {
            headers.insert(header::CONTENT_DISPOSITION, disposition);
        }
    }
    response
}

/// `attachment; filename="<name>"`, using the RFC 5987 form for names that
/// are not plain ASCII.
fn attachment_disposition(filename: &str) -> Option<HeaderValue> {
    let plain = filename.is_ascii() && !filename.chars().any(|c| c.is_ascii_control());
    let value = if plain {
        format!(
            "attachment; filename=\"{}\"",
            filename.replace('\\', "\\\\").replace('"', "\\\"")
        )
    } else {
        format!(
            "attachment; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    };
    HeaderValue::from_str(&value).ok()
}
