//! Captured manifest bodies.
//!
//! When the extraction worker hands back the playlist text itself, the relay
//! serves it from here instead of fetching the (often short-lived) upstream
//! URL again.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A captured playlist. Never mutated after insertion.
#[derive(Debug)]
pub struct ManifestEntry {
    /// Raw playlist text as captured upstream.
    pub body: String,
    /// Referer to present when fetching anything the playlist references.
    pub referer: String,
    /// Directory of the original playlist URL, ending in `/`.
    pub base_url: String,
    created_at: Instant,
}

impl ManifestEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() < ttl
    }
}

/// Thread-safe TTL map from manifest id to captured playlist.
#[derive(Clone)]
pub struct ManifestCache {
    entries: Arc<DashMap<String, Arc<ManifestEntry>>>,
    ttl: Duration,
}

impl ManifestCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_ttl(Duration::from_secs(ttl_secs))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Store a playlist under `id`, replacing any earlier capture.
    pub fn insert(
        &self,
        id: impl Into<String>,
        body: impl Into<String>,
        referer: impl Into<String>,
        base_url: impl Into<String>,
    ) {
        let id = id.into();
        let entry = ManifestEntry {
            body: body.into(),
            referer: referer.into(),
            base_url: base_url.into(),
            created_at: Instant::now(),
        };
        tracing::debug!(id = %id, bytes = entry.body.len(), "Cached manifest");
        self.entries.insert(id, Arc::new(entry));
    }

    /// Fetch a playlist that has not yet expired.
    ///
    /// An expired entry is a miss even if it has not been purged yet.
    pub fn get(&self, id: &str) -> Option<Arc<ManifestEntry>> {
        self.entries
            .get(id)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a fresh entry exists for `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(self.ttl));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "Purged expired manifests");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::new(600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let cache = ManifestCache::new(60);
        cache.insert(
            "movie-550",
            "#EXTM3U\n",
            "https://x.example/",
            "https://x.example/",
        );

        let entry = cache.get("movie-550").unwrap();
        assert_eq!(entry.body, "#EXTM3U\n");
        assert_eq!(entry.referer, "https://x.example/");
        assert!(cache.contains("movie-550"));
        assert!(!cache.contains("movie-551"));
    }

    #[test]
    fn expired_entry_is_a_miss_while_still_present() {
        let cache = ManifestCache::with_ttl(Duration::ZERO);
        cache.insert("movie-550", "#EXTM3U\n", "", "https://x.example/");

        assert!(cache.get("movie-550").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }
}
