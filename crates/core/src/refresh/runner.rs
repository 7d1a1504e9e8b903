//! Refresh scheduler implementation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{ArtifactStore, FilenameClaims};
use crate::catalog::{CatalogEntry, CatalogMerger, SourceManifest};
use crate::fetcher::ManifestFetcher;
use crate::metrics::{ARTIFACTS, REFRESH_CYCLES, REFRESH_CYCLE_DURATION, SOURCE_FETCHES};
use crate::notify::{NoopSink, NotificationSink};
use crate::state::{CatalogState, PublishedCatalog};

use super::config::RefreshConfig;
use super::types::{CycleReport, SchedulerStatus, SourceFailure};

/// The refresh scheduler - rebuilds and publishes the merged catalog.
pub struct RefreshScheduler {
    config: RefreshConfig,
    fetcher: Arc<dyn ManifestFetcher>,
    cache: Arc<dyn ArtifactStore>,
    merger: CatalogMerger,
    sink: Arc<dyn NotificationSink>,
    state: Arc<CatalogState>,

    // Runtime state
    cycle_lock: Mutex<()>,
    cycles: AtomicU64,
    last_report: RwLock<Option<CycleReport>>,
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl RefreshScheduler {
    /// Create a new scheduler publishing into `state`.
    pub fn new(
        config: RefreshConfig,
        fetcher: Arc<dyn ManifestFetcher>,
        cache: Arc<dyn ArtifactStore>,
        merger: CatalogMerger,
        state: Arc<CatalogState>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            fetcher,
            cache,
            merger,
            sink: Arc::new(NoopSink),
            state,
            cycle_lock: Mutex::new(()),
            cycles: AtomicU64::new(0),
            last_report: RwLock::new(None),
            running: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Set the sink notified about newly cached entries.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.config.interval_secs)
    }

    /// Start the timer loop: one cycle right away, then one cycle per
    /// interval, counted from the end of the previous cycle.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Refresh scheduler already running");
            return;
        }

        let scheduler = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(
                "Refresh loop started ({} sources, every {:?})",
                scheduler.config.sources.len(),
                scheduler.interval()
            );
            loop {
                scheduler.run_cycle().await;

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Refresh loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(scheduler.interval()) => {
                        if !scheduler.running.load(Ordering::Relaxed) {
                            break;
                        }
                    }
                }
            }
            info!("Refresh loop stopped");
        });
    }

    /// Stop the timer loop. A cycle in progress runs to completion.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Refresh scheduler not running");
            return;
        }

        info!("Stopping refresh scheduler");
        let _ = self.shutdown_tx.send(());
    }

    /// Get current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
            last_report: self.last_report.read().await.clone(),
        }
    }

    /// Run one full cycle across all sources and publish the result.
    ///
    /// Concurrent callers are serialized. Nothing is published when every
    /// source fails; the previous catalog stays visible.
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle_lock.lock().await;
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;

        let started = Instant::now();
        info!(cycle, "Updating cache...");

        let mut report = CycleReport::new(cycle);
        let mut resolved = Vec::with_capacity(self.config.sources.len());
        let mut claims = FilenameClaims::new();

        for source in &self.config.sources {
            let manifest = match self.fetcher.fetch(source).await {
                Ok(manifest) => {
                    SOURCE_FETCHES.with_label_values(&["success"]).inc();
                    manifest
                }
                Err(e) => {
                    warn!(source = %source, "Failed to fetch source, skipping: {}", e);
                    SOURCE_FETCHES.with_label_values(&["failed"]).inc();
                    report.failed_sources.push(SourceFailure {
                        source: source.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let mut apps = Vec::with_capacity(manifest.apps.len());
            for entry in manifest.apps {
                if let Some(entry) = self.process_entry(entry, &mut claims, &mut report).await {
                    apps.push(entry);
                }
            }

            report.sources_ok += 1;
            resolved.push(SourceManifest {
                origin: manifest.origin,
                apps,
            });
        }

        if report.sources_ok > 0 {
            let catalog = self.merger.merge(resolved);
            report.entries = catalog.apps.len();

            self.state
                .publish(PublishedCatalog {
                    catalog,
                    cycle,
                    sources: report.sources_ok,
                    published_at: Utc::now(),
                })
                .await;
            report.published = true;
        } else {
            warn!(cycle, "No source could be fetched, keeping previous catalog");
        }

        let elapsed = started.elapsed();
        report.duration_ms = elapsed.as_millis() as u64;
        report.finished_at = Some(Utc::now());

        REFRESH_CYCLES
            .with_label_values(&[report.result_label()])
            .inc();
        REFRESH_CYCLE_DURATION
            .with_label_values(&[])
            .observe(elapsed.as_secs_f64());

        info!(
            cycle,
            sources = report.sources_ok,
            failed_sources = report.failed_sources.len(),
            entries = report.entries,
            downloaded = report.downloaded,
            cache_hits = report.cache_hits,
            artifact_failures = report.artifact_failures,
            "Cycle finished in {:?}",
            elapsed
        );

        *self.last_report.write().await = Some(report.clone());
        report
    }

    /// Cache one entry's artifact and rewrite its URL.
    ///
    /// The artifact's filename is claimed for the rest of the cycle. Returns
    /// `None` only when the artifact failed and uncached entries are
    /// configured to be dropped.
    async fn process_entry(
        &self,
        entry: CatalogEntry,
        claims: &mut FilenameClaims,
        report: &mut CycleReport,
    ) -> Option<CatalogEntry> {
        info!("Found {}, v.{}", entry.name, entry.version);

        let fallback = entry.fallback_filename();
        match self.cache.resolve(&entry.download_url, &fallback, claims).await {
            Ok(artifact) => {
                claims.claim(&artifact.filename, &artifact.resolved_url);
                let entry = self.merger.rewrite(entry, &artifact);
                if artifact.cache_hit {
                    report.cache_hits += 1;
                    ARTIFACTS.with_label_values(&["cache_hit"]).inc();
                } else {
                    report.downloaded += 1;
                    ARTIFACTS.with_label_values(&["downloaded"]).inc();
                    self.sink.notify(&entry, &artifact).await;
                }
                debug!(app = %entry.name, url = %entry.download_url, "Rewrote download URL");
                Some(entry)
            }
            Err(e) => {
                warn!(
                    app = %entry.name,
                    url = %entry.download_url,
                    "Failed to cache artifact: {}",
                    e
                );
                report.artifact_failures += 1;
                ARTIFACTS.with_label_values(&["failed"]).inc();
                (!self.config.drop_uncached_entries).then_some(entry)
            }
        }
    }
}
