use crate::config::Config;
use crate::relay::{self, ManifestCache, RelayState};
use crate::resolver::{ResultCache, Resolver};
use anyhow::{Context, Result};
use axum::{
    extract::FromRef,
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use hlsrelay_media::RelayUrls;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

mod error;
pub mod routes_stream;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Tiered resolver (owns the result cache and single-flight gate)
    pub resolver: Arc<Resolver>,
    /// Relay handlers' state (HTTP client, rewriter, manifest cache)
    pub relay: RelayState,
}

impl AppContext {
    /// Wire caches, resolver and relay from configuration.
    pub fn from_config(config: Config) -> Self {
        let results = ResultCache::new(config.resolver.result_ttl_secs);
        let manifests = ManifestCache::new(config.relay.manifest_ttl_secs);
        let resolver = Resolver::from_config(&config, results, manifests.clone());
        Self::new(config, resolver, manifests)
    }

    /// Build a context around an already assembled resolver.
    ///
    /// `manifests` must be the cache the resolver's tiers write to.
    pub fn new(config: Config, resolver: Resolver, manifests: ManifestCache) -> Self {
        let urls = RelayUrls::new(config.server.public_url.clone());
        let relay = RelayState::new(&config.relay, manifests, urls);
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            relay,
        }
    }

    pub fn results(&self) -> &ResultCache {
        self.resolver.results()
    }

    pub fn manifests(&self) -> &ManifestCache {
        self.relay.manifests()
    }
}

impl FromRef<AppContext> for RelayState {
    fn from_ref(ctx: &AppContext) -> Self {
        ctx.relay.clone()
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
        ]);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(routes_stream::stream_routes())
        .nest("/relay", relay::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "hlsrelay",
    }))
}

/// Start a background task that periodically purges expired cache entries.
///
/// Expiry is enforced on read; this only reclaims memory.
pub fn start_cleanup_task(
    results: ResultCache,
    manifests: ManifestCache,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let purged = results.purge_expired() + manifests.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Cache cleanup");
            }
        }
    })
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let cleanup_interval = config.relay.cleanup_interval_secs;
    let ctx = AppContext::from_config(config);
    let cleanup = start_cleanup_task(ctx.results().clone(), ctx.manifests().clone(), cleanup_interval);

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
