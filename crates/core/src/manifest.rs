//! Asset manifest pre-fetched at install time.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Assets shipped with the application shell: local static files, the
/// two cross-origin stylesheet sources, and the icon set.
pub const DEFAULT_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./manifest.json",
    "./sw.js",
    "https://cdn.tailwindcss.com",
    "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;700&display=swap",
    "./icons/icon-48x48.png",
    "./icons/icon-72x72.png",
    "./icons/icon-96x96.png",
    "./icons/icon-128x128.png",
    "./icons/icon-144x144.png",
    "./icons/icon-152x152.png",
    "./icons/icon-192x192.png",
    "./icons/icon-256x256.png",
    "./icons/icon-384x384.png",
    "./icons/icon-512x512.png",
];

/// Ordered, immutable list of asset URLs for one agent version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest {
    entries: Vec<String>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::new(DEFAULT_ASSETS.iter().map(|s| s.to_string()))
    }
}

impl AssetManifest {
    pub fn new(entries: impl IntoIterator<Item = String>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every entry against the scope, keeping manifest order.
    ///
    /// Each entry resolves independently; one bad entry does not affect
    /// the others.
    pub fn resolve(&self, scope: &Url) -> Vec<(String, Result<Url, Error>)> {
        self.entries
            .iter()
            .map(|entry| (entry.clone(), resolve_entry(scope, entry)))
            .collect()
    }
}

/// Resolve one manifest entry against the scope URL.
pub fn resolve_entry(scope: &Url, entry: &str) -> Result<Url, Error> {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty manifest entry".into()));
    }
    let mut url = scope
        .join(trimmed)
        .map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;
    url.set_fragment(None);
    Ok(url)
}
