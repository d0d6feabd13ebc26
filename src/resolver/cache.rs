//! Short-lived cache of successful resolutions.

use dashmap::DashMap;
use hlsrelay_common::ExtractionResult;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CachedResult {
    result: ExtractionResult,
    stored_at: Instant,
}

impl CachedResult {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Thread-safe TTL cache keyed by [`StreamRequest::cache_key`].
///
/// Only successful extractions are stored. Expired entries read as misses
/// and are reclaimed by [`ResultCache::purge_expired`].
///
/// [`StreamRequest::cache_key`]: hlsrelay_common::StreamRequest::cache_key
#[derive(Clone)]
pub struct ResultCache {
    entries: Arc<DashMap<String, CachedResult>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_ttl(Duration::from_secs(ttl_secs))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Look up a fresh result.
    pub fn get(&self, key: &str) -> Option<ExtractionResult> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.result.clone())
    }

    /// Store a result, replacing any previous entry for the key.
    pub fn insert(&self, key: impl Into<String>, result: ExtractionResult) {
        self.entries.insert(
            key.into(),
            CachedResult {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(self.ttl));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "Purged expired resolutions");
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

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(300)
    }
}
