//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the proxy server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Published catalog and scheduler status (collected dynamically)
//!
//! Core metrics (refresh cycles, artifacts, notifications) are registered
//! into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "altproxy_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("altproxy_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "altproxy_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics (collected dynamically)
// =============================================================================

/// Whether a catalog has been published (1) or not yet (0).
pub static CATALOG_READY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "altproxy_catalog_ready",
        "Whether a merged catalog has been published",
    )
    .unwrap()
});

/// Apps in the published catalog.
pub static CATALOG_APPS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "altproxy_catalog_apps",
        "Number of apps in the published catalog",
    )
    .unwrap()
});

/// Refresh loop running state (1 = running, 0 = stopped).
pub static REFRESH_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "altproxy_refresh_running",
        "Whether the refresh loop is running (1) or stopped (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Catalog
    registry.register(Box::new(CATALOG_READY.clone())).unwrap();
    registry.register(Box::new(CATALOG_APPS.clone())).unwrap();
    registry
        .register(Box::new(REFRESH_RUNNING.clone()))
        .unwrap();

    // Core metrics (refresh, cache, notifications)
    for metric in altproxy_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current
/// values from the published catalog and the scheduler.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.catalog().current().await {
        Some(published) => {
            CATALOG_READY.set(1);
            CATALOG_APPS.set(published.catalog.apps.len() as i64);
        }
        None => {
            CATALOG_READY.set(0);
            CATALOG_APPS.set(0);
        }
    }

    if let Some(scheduler) = state.scheduler() {
        let status = scheduler.status().await;
        REFRESH_RUNNING.set(if status.running { 1 } else { 0 });
    }
}

static CACHE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/cache/[^/]+$").unwrap());

/// Normalize a path for metric labels (replace cached filenames with a
/// placeholder).
pub fn normalize_path(path: &str) -> String {
    if CACHE_PATH.is_match(path) {
        "/cache/{file}".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_cache_file() {
        assert_eq!(normalize_path("/cache/Winston_1.2.0.ipa"), "/cache/{file}");
        assert_eq!(normalize_path("/cache/Foo%20Bar.ipa"), "/cache/{file}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/apps.json"), "/apps.json");
        assert_eq!(normalize_path("/cache/"), "/cache/");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("altproxy_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Touch all metrics to ensure they appear in output
        // (Prometheus only outputs metrics that have been accessed)
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        CATALOG_READY.set(0);
        CATALOG_APPS.set(0);
        altproxy_core::metrics::REFRESH_CYCLES
            .with_label_values(&["published"])
            .inc_by(0);
        altproxy_core::metrics::ARTIFACTS
            .with_label_values(&["cache_hit"])
            .inc_by(0);

        let output = encode_metrics();

        // HTTP metrics
        assert!(output.contains("altproxy_http_request_duration_seconds"));
        assert!(output.contains("altproxy_http_requests_in_flight"));

        // Catalog metrics
        assert!(output.contains("altproxy_catalog_ready"));
        assert!(output.contains("altproxy_catalog_apps"));

        // Core metrics
        assert!(output.contains("altproxy_refresh_cycles_total"));
        assert!(output.contains("altproxy_artifacts_total"));
        assert!(output.contains("altproxy_artifact_bytes_downloaded_total"));
    }
}
