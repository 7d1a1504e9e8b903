//! Catalog documents as exchanged with AltStore clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One app listed in a catalog.
///
/// Only the fields the proxy rewrites or names files after are typed.
/// Everything else a source publishes, `size` and the descriptions included,
/// stays in `extra` exactly as received (nulls and odd types too) and is
/// read through the accessors below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntry {
    /// Advertised artifact size in bytes.
    ///
    /// Sources are not consistent about `size`; anything that is not a
    /// non-negative integer (or a string holding one) is treated as unknown.
    pub fn size(&self) -> Option<u64> {
        match self.extra.get("size")? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn localized_description(&self) -> Option<&str> {
        self.text("localizedDescription")
    }

    pub fn version_description(&self) -> Option<&str> {
        self.text("versionDescription")
    }

    pub fn icon_url(&self) -> Option<&str> {
        self.text("iconURL")
    }

    /// Version notes if present, otherwise the general description.
    pub fn description(&self) -> Option<&str> {
        self.version_description()
            .filter(|d| !d.is_empty())
            .or(self.localized_description())
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// Filename used when neither the transfer nor the URL yields one:
    /// `<name>_<version>` with spaces, colons and slashes replaced.
    pub fn fallback_filename(&self) -> String {
        let raw = if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.name, self.version)
        };
        raw.replace([' ', ':', '/', '\\'], "_")
    }
}

/// A source manifest as fetched during one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceManifest {
    /// URL the manifest was fetched from.
    pub origin: String,
    pub apps: Vec<CatalogEntry>,
}

/// Wire shape of a remote manifest; only `apps` is consumed.
#[derive(Debug, Deserialize)]
pub(crate) struct ManifestDocument {
    pub apps: Vec<CatalogEntry>,
}

/// The aggregated catalog served at `/apps.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCatalog {
    pub name: String,
    pub subtitle: String,
    #[serde(rename = "iconURL")]
    pub icon_url: String,
    pub website: String,
    pub apps: Vec<CatalogEntry>,
    #[serde(default)]
    pub news: Vec<Value>,
}
