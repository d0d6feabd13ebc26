use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix for relay URLs handed to players (empty = same-origin relative URLs)
    #[serde(default)]
    pub public_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// How long a successful resolution is reused (default: 300)
    #[serde(default = "default_result_ttl")]
    pub result_ttl_secs: u64,

    /// Base of the embed player URLs used when every tier fails
    #[serde(default = "default_embed_base_url")]
    pub embed_base_url: String,
}

fn default_result_ttl() -> u64 {
    300
}

fn default_embed_base_url() -> String {
    "https://www.vidking.net/embed".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            result_ttl_secs: default_result_ttl(),
            embed_base_url: default_embed_base_url(),
        }
    }
}

/// Local browser-automation extraction agent (tier 1).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Program to launch (default: "python3")
    #[serde(default = "default_worker_program")]
    pub program: String,

    /// Arguments placed before the request arguments
    #[serde(default = "default_worker_args")]
    pub args: Vec<String>,

    /// Hard timeout for one extraction (default: 90)
    #[serde(default = "default_worker_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_worker_program() -> String {
    "python3".to_string()
}

fn default_worker_args() -> Vec<String> {
    vec!["bingeflix_scraper.py".to_string()]
}

fn default_worker_timeout() -> u64 {
    90
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_worker_program(),
            args: default_worker_args(),
            timeout_secs: default_worker_timeout(),
        }
    }
}

/// Remote extraction service (tier 2).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the service, e.g. "https://extractor.example"
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

fn default_remote_timeout() -> u64 {
    30
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

/// HTML fallback scraper (tier 3).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_scraper_timeout")]
    pub timeout_secs: u64,
}

fn default_scraper_timeout() -> u64 {
    15
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_scraper_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// How long a captured manifest body is served (default: 600)
    #[serde(default = "default_manifest_ttl")]
    pub manifest_ttl_secs: u64,

    /// Timeout for connecting upstream and receiving response headers (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// User agent presented to upstream hosts
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Interval between expired-entry sweeps (default: 60)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_manifest_ttl() -> u64 {
    600
}

fn default_request_timeout() -> u64 {
    30
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_cleanup_interval() -> u64 {
    60
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            manifest_ttl_secs: default_manifest_ttl(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}
