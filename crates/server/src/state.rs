use std::path::Path;
use std::sync::Arc;

use altproxy_core::{CatalogState, Config, RefreshScheduler, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    base_url: String,
    catalog: Arc<CatalogState>,
    scheduler: Option<Arc<RefreshScheduler>>,
}

impl AppState {
    /// `base_url` is the normalized public URL the catalog links point at.
    pub fn new(config: Config, base_url: String, catalog: Arc<CatalogState>) -> Self {
        Self {
            config,
            base_url,
            catalog,
            scheduler: None,
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<RefreshScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache.dir
    }

    pub fn scheduler(&self) -> Option<&Arc<RefreshScheduler>> {
        self.scheduler.as_ref()
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }
}
