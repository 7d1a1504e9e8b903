//! Catalog data model and the merger that assembles the served catalog.
//!
//! Sources are fetched fresh every cycle and never persisted; the merged
//! catalog is immutable once built and replaced wholesale by the next cycle.

mod merger;
mod types;

pub use merger::CatalogMerger;
pub use types::{CatalogEntry, MergedCatalog, SourceManifest};

pub(crate) use types::ManifestDocument;
