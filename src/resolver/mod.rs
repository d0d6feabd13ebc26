//! Tiered stream resolution.
//!
//! A [`Resolver`] owns an ordered list of [`ExtractionTier`]s, the result
//! cache and the single-flight gate. Tiers are tried strictly one after the
//! other; the first usable stream wins. When every tier fails the request
//! resolves to the canonical embed player page, so resolution itself never
//! fails.

mod cache;
mod gate;
mod remote;
mod scrape;
mod tier;
mod worker;

pub use cache::ResultCache;
pub use gate::{SingleFlightGate, SingleFlightPermit};
pub use remote::RemoteTier;
pub use scrape::{find_manifest_url, ScrapeTier};
pub use tier::{ExtractionTier, TierError};
pub use worker::{parse_response, WorkerCommand, WorkerOutput, WorkerResponse, WorkerTier};

use crate::config::Config;
use crate::relay::ManifestCache;
use hlsrelay_common::{ContentKind, ExtractionResult, StreamRequest};
use hlsrelay_media::RelayUrls;
use std::time::Instant;

/// Builds canonical embed player URLs.
#[derive(Debug, Clone)]
pub struct EmbedUrls {
    base: String,
}

impl EmbedUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/movie/{id}` or `{base}/tv/{id}/{season}/{episode}`.
    pub fn url_for(&self, request: &StreamRequest) -> String {
        match request.kind {
            ContentKind::Movie => format!("{}/movie/{}", self.base, request.catalog_id),
            ContentKind::Series => format!(
                "{}/tv/{}/{}/{}",
                self.base,
                request.catalog_id,
                request.season.unwrap_or(1),
                request.episode.unwrap_or(1)
            ),
        }
    }
}

impl Default for EmbedUrls {
    fn default() -> Self {
        Self::new("https://www.vidking.net/embed")
    }
}

/// Resolves stream requests through the extraction tiers.
pub struct Resolver {
    tiers: Vec<Box<dyn ExtractionTier>>,
    gate: SingleFlightGate,
    results: ResultCache,
    manifests: ManifestCache,
    urls: RelayUrls,
    embeds: EmbedUrls,
}

impl Resolver {
    /// A resolver with no tiers; add them with [`Resolver::with_tier`].
    pub fn new(
        results: ResultCache,
        manifests: ManifestCache,
        urls: RelayUrls,
        embeds: EmbedUrls,
    ) -> Self {
        Self {
            tiers: Vec::new(),
            gate: SingleFlightGate::new(),
            results,
            manifests,
            urls,
            embeds,
        }
    }

    /// Append a tier. Tiers run in the order they were added.
    pub fn with_tier(mut self, tier: impl ExtractionTier + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// Build the standard worker → remote → scrape chain from config.
    pub fn from_config(config: &Config, results: ResultCache, manifests: ManifestCache) -> Self {
        let urls = RelayUrls::new(config.server.public_url.clone());
        let embeds = EmbedUrls::new(config.resolver.embed_base_url.clone());
        let mut resolver = Self::new(results, manifests.clone(), urls.clone(), embeds.clone());

        if config.worker.enabled {
            resolver = resolver.with_tier(WorkerTier::new(&config.worker, manifests, urls.clone()));
        }
        if config.remote.enabled {
            resolver = resolver.with_tier(RemoteTier::new(&config.remote, urls.clone()));
        }
        if config.scraper.enabled {
            resolver = resolver.with_tier(ScrapeTier::new(
                &config.scraper,
                &config.relay.user_agent,
                embeds,
                urls,
            ));
        }

        tracing::info!(tiers = ?resolver.tier_names(), "Resolver configured");
        resolver
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    pub fn results(&self) -> &ResultCache {
        &self.results
    }

    pub fn gate(&self) -> &SingleFlightGate {
        &self.gate
    }

    /// Resolve a request. Always returns a result.
    pub async fn resolve(&self, request: &StreamRequest) -> ExtractionResult {
        let key = request.cache_key();

        if let Some(cached) = self.results.get(&key) {
            tracing::debug!(key = %key, source = %cached.source, "Result cache hit");
            return self.refresh_stale_manifest(cached);
        }

        for tier in &self.tiers {
            let _permit = if tier.single_flight() {
                match self.gate.try_acquire() {
                    Some(permit) => Some(permit),
                    None => {
                        tracing::info!(tier = tier.name(), key = %key, "Tier busy, skipping");
                        continue;
                    }
                }
            } else {
                None
            };

            let start = Instant::now();
            match tier.extract(request).await {
                Ok(result) => {
                    tracing::info!(
                        tier = tier.name(),
                        key = %key,
                        source = %result.source,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Stream resolved"
                    );
                    self.results.insert(key.clone(), result.clone());
                    return result;
                }
                Err(e) => {
                    tracing::warn!(
                        tier = tier.name(),
                        key = %key,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Tier failed: {}",
                        e
                    );
                }
            }
        }

        let embed_url = self.embeds.url_for(request);
        tracing::info!(key = %key, url = %embed_url, "All tiers failed, falling back to embed");
        ExtractionResult::embed(embed_url, "embed")
    }

    /// Point a cached result at the upstream directly when its captured
    /// manifest has expired.
    fn refresh_stale_manifest(&self, mut result: ExtractionResult) -> ExtractionResult {
        if let Some(id) = self.urls.manifest_id(&result.proxy_url) {
            if !self.manifests.contains(id) {
                tracing::debug!(id = %id, "Captured manifest expired, using pass-through");
                result.proxy_url = self.urls.proxy_url(&result.original_url, &result.referer);
            }
        }
        result
    }
}
