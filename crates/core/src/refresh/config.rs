//! Refresh scheduler configuration.

use serde::{Deserialize, Deserializer, Serialize};

/// How the server behaves before the first refresh cycle has published.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessPolicy {
    /// Bind immediately; `/apps.json` answers 503 until the first publish.
    #[default]
    ServeUnavailable,
    /// Do not bind the listener until the first publish.
    WaitForFirstCycle,
}

/// Refresh cycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    /// Source manifest URLs, as a list or a single comma separated string.
    #[serde(
        default = "default_sources",
        deserialize_with = "deserialize_source_list"
    )]
    pub sources: Vec<String>,
    /// Pause between the end of one cycle and the start of the next.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Timeout for fetching a single manifest, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub readiness: ReadinessPolicy,
    /// Drop entries whose artifact could not be cached instead of passing
    /// them through with their upstream URL.
    #[serde(default)]
    pub drop_uncached_entries: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            interval_secs: default_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            readiness: ReadinessPolicy::default(),
            drop_uncached_entries: false,
        }
    }
}

/// Sources used when none are configured.
pub const DEFAULT_SOURCES: [&str; 2] = [
    "https://raw.githubusercontent.com/arichornlover/arichornlover.github.io/main/apps.json",
    "https://raw.githubusercontent.com/lo-cafe/winston-altstore/main/apps.json",
];

fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
}

fn default_interval() -> u64 {
    3600
}

fn default_fetch_timeout() -> u64 {
    30
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceList {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_source_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match SourceList::deserialize(deserializer)? {
        SourceList::List(items) => items,
        SourceList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
    };

    Ok(raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
