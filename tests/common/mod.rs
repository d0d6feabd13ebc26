//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] from a config.
//! The `with_server*` constructors start Axum on a random port for HTTP-level
//! testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use hlsrelay::config::Config;
use hlsrelay::server::{create_router, AppContext};

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Harness with every extraction tier disabled.
    pub fn new() -> Self {
        Self::with_config(offline_config())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            ctx: AppContext::from_config(config),
        }
    }

    pub fn with_context(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::serve(Self::new()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        Self::serve(Self::with_config(config)).await
    }

    pub async fn serve(harness: Self) -> (Self, SocketAddr) {
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Default config with all extraction tiers turned off.
pub fn offline_config() -> Config {
    let mut config = Config::default();
    config.worker.enabled = false;
    config.remote.enabled = false;
    config.scraper.enabled = false;
    config
}

/// Absolute URL on the test server for a (possibly relative) relay URL.
pub fn url(addr: SocketAddr, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("http://{}{}", addr, path)
    }
}
