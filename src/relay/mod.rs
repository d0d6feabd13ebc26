//! HLS relay: serves captured manifests and proxies upstream fetches.
//!
//! Every URI inside a relayed playlist points back at `/relay/proxy`, so a
//! player never talks to the upstream host directly. The relay adds the
//! headers the upstream's hot-link protection expects.

mod manifest_cache;
mod proxy;

pub use manifest_cache::{ManifestCache, ManifestEntry};
pub use proxy::{options_preflight, proxy_passthrough, serve_manifest, ProxyQuery};

use crate::config::RelayConfig;
use axum::extract::FromRef;
use axum::routing::get;
use axum::Router;
use hlsrelay_media::{ManifestRewriter, RelayUrls};
use reqwest::Client;
use std::time::Duration;

/// State shared by the relay handlers.
#[derive(Clone)]
pub struct RelayState {
    pub(crate) client: Client,
    pub(crate) rewriter: ManifestRewriter,
    pub(crate) manifests: ManifestCache,
    /// Bound on connecting and receiving response headers. Bodies are not
    /// bounded, so long segment downloads stream to completion.
    pub(crate) request_timeout: Duration,
}

impl RelayState {
    pub fn new(config: &RelayConfig, manifests: ManifestCache, urls: RelayUrls) -> Self {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build relay HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            rewriter: ManifestRewriter::new(urls),
            manifests,
            request_timeout,
        }
    }

    pub fn manifests(&self) -> &ManifestCache {
        &self.manifests
    }
}

/// Relay routes, mounted under `/relay`.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    RelayState: FromRef<S>,
{
    Router::new()
        .route("/manifest/:id", get(serve_manifest))
        .route("/proxy", get(proxy_passthrough).options(options_preflight))
}
