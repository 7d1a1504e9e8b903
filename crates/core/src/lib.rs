pub mod cache;
pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod notify;
pub mod refresh;
pub mod state;
pub mod testing;

pub use cache::{ArtifactStore, CacheError, CachedArtifact, FilenameClaims, HttpArtifactCache};
pub use catalog::{CatalogEntry, CatalogMerger, MergedCatalog, SourceManifest};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, prepare_cache_dir, validate_config,
    Config, ConfigError, SanitizedConfig,
};
pub use fetcher::{FetchError, HttpManifestFetcher, ManifestFetcher};
pub use notify::{create_sink, DiscordWebhookSink, NoopSink, NotificationSink};
pub use refresh::{CycleReport, ReadinessPolicy, RefreshConfig, RefreshScheduler, SchedulerStatus};
pub use state::{CatalogState, PublishedCatalog};
