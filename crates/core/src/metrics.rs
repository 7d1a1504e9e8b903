//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Refresh cycles (count, duration, published catalog size)
//! - Source manifest fetches
//! - Artifact cache decisions and downloaded bytes
//! - Notifications

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Refresh Metrics
// =============================================================================

/// Refresh cycles total by result.
pub static REFRESH_CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("altproxy_refresh_cycles_total", "Total refresh cycles"),
        &["result"], // "published", "partial", "failed"
    )
    .unwrap()
});

/// Refresh cycle duration in seconds.
pub static REFRESH_CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "altproxy_refresh_cycle_duration_seconds",
            "Duration of refresh cycles",
        )
        .buckets(vec![
            0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
        ]),
        &[],
    )
    .unwrap()
});

/// Source manifest fetches total by result.
pub static SOURCE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "altproxy_source_fetches_total",
            "Total source manifest fetches",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Artifacts processed total by result.
pub static ARTIFACTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("altproxy_artifacts_total", "Total artifacts processed"),
        &["result"], // "downloaded", "cache_hit", "failed"
    )
    .unwrap()
});

/// Bytes written to the cache by downloads.
pub static ARTIFACT_BYTES_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "altproxy_artifact_bytes_downloaded_total",
        "Total artifact bytes downloaded into the cache",
    )
    .unwrap()
});

// =============================================================================
// Notification Metrics
// =============================================================================

/// Notifications total by result.
pub static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("altproxy_notifications_total", "Total notifications sent"),
        &["result"], // "sent", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(REFRESH_CYCLES.clone()),
        Box::new(REFRESH_CYCLE_DURATION.clone()),
        Box::new(SOURCE_FETCHES.clone()),
        Box::new(ARTIFACTS.clone()),
        Box::new(ARTIFACT_BYTES_DOWNLOADED.clone()),
        Box::new(NOTIFICATIONS.clone()),
    ]
}
