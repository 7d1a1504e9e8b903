//! Cache filename derivation.
//!
//! Priority: the filename advertised by the transfer (Content-Disposition),
//! then the last path segment of the resolved URL, then the caller's
//! fallback. The configured extension is appended when missing.
//!
//! Within one refresh cycle a name belongs to the first resolved URL that
//! claims it; see [`FilenameClaims`].

use std::collections::HashMap;

use reqwest::Url;

/// Name used when every other source of a filename is unusable.
const LAST_RESORT_NAME: &str = "artifact";

/// Extract the filename from a Content-Disposition header value.
///
/// `filename*=` (RFC 5987, percent-encoded) wins over plain `filename=`.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in value.split(';') {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let raw = raw.trim();

        match key.as_str() {
            "filename*" => {
                // charset'language'percent-encoded-name
                let encoded = raw.rsplit('\'').next().unwrap_or(raw);
                if let Ok(decoded) = urlencoding::decode(encoded) {
                    extended = Some(decoded.into_owned());
                }
            }
            "filename" => {
                plain = Some(raw.trim_matches('"').to_string());
            }
            _ => {}
        }
    }

    extended
        .or(plain)
        .and_then(|name| sanitize(&name))
}

fn last_path_segment(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).ok()?;
    sanitize(&decoded)
}

/// Reduce a candidate name to a single safe path component.
fn sanitize(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .trim_start_matches('.')
        .to_string();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn with_extension(name: String, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    let suffix = format!(".{}", extension.to_ascii_lowercase());
    if name.to_ascii_lowercase().ends_with(&suffix) {
        return name;
    }

    // "build." must not turn into "build..ipa"
    let stem = name.trim_end_matches('.');
    let stem = if stem.is_empty() { LAST_RESORT_NAME } else { stem };
    format!("{}.{}", stem, extension)
}

/// Cache filename built from the caller's fallback name alone.
pub fn fallback_filename(fallback: &str, extension: &str) -> String {
    let name = sanitize(&fallback.replace([' ', ':', '/', '\\'], "_"))
        .unwrap_or_else(|| LAST_RESORT_NAME.to_string());
    with_extension(name, extension)
}

/// Derive the cache filename for an artifact.
pub fn derive_filename(
    disposition: Option<&str>,
    resolved_url: &Url,
    fallback: &str,
    extension: &str,
) -> String {
    match disposition
        .and_then(filename_from_disposition)
        .or_else(|| last_path_segment(resolved_url))
    {
        Some(name) => with_extension(name, extension),
        None => fallback_filename(fallback, extension),
    }
}

/// Whether `name` may be served from the cache directory.
///
/// Rejects anything that could escape the directory and the dot-prefixed
/// temporary files of in-progress downloads. Separators are refused, so the
/// only traversal left is a name starting with a dot. Dots inside a name
/// (`uYou..Plus.ipa`) are fine.
pub fn is_servable_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

/// Cache filenames handed out during one refresh cycle.
///
/// A name belongs to the resolved URL that claimed it first. Another
/// artifact whose derived name is taken gets the fallback name instead, or a
/// numbered variant of it, so two different artifacts never share a file.
#[derive(Debug, Clone, Default)]
pub struct FilenameClaims {
    owners: HashMap<String, String>,
}

impl FilenameClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `filename` is unclaimed or already owned by `url`.
    pub fn is_available(&self, filename: &str, url: &str) -> bool {
        self.owners.get(filename).map_or(true, |owner| owner == url)
    }

    /// Record `filename` as owned by `url`. The first owner wins.
    pub fn claim(&mut self, filename: impl Into<String>, url: impl Into<String>) {
        self.owners.entry(filename.into()).or_insert_with(|| url.into());
    }

    /// Owner of `filename`, if claimed.
    pub fn owner(&self, filename: &str) -> Option<&str> {
        self.owners.get(filename).map(String::as_str)
    }

    /// Pick the name `url` should be stored under.
    ///
    /// Tries `preferred`, then the fallback name, then `<fallback stem>_2`,
    /// `_3` and so on.
    pub fn pick(&self, preferred: String, fallback: &str, extension: &str, url: &str) -> String {
        if self.is_available(&preferred, url) {
            return preferred;
        }

        let fallback = fallback_filename(fallback, extension);
        if self.is_available(&fallback, url) {
            return fallback;
        }

        let (stem, ext) = fallback
            .rsplit_once('.')
            .unwrap_or((fallback.as_str(), extension));
        let mut n = 2u32;
        loop {
            let candidate = format!("{}_{}.{}", stem, n, ext);
            if self.is_available(&candidate, url) {
                return candidate;
            }
            n += 1;
        }
    }
}
