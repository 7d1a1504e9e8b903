use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{catalog, handlers, status};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .with_state(Arc::clone(&state));

    Router::new()
        // Status page
        .route("/", get(status::index))
        // What AltStore clients talk to
        .route("/apps.json", get(catalog::apps_json))
        .route("/cache/{filename}", get(catalog::cache_file))
        // Prometheus scrape endpoint
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
