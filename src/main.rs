mod cli;

use hlsrelay::{
    config,
    relay::ManifestCache,
    resolver::{ResultCache, Resolver},
    server::{self, routes_stream},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting hlsrelay");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "hlsrelay=trace,hlsrelay_media=debug,tower_http=debug".to_string()
        } else {
            "hlsrelay=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so `resolve` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Resolve {
            content_id,
            kind,
            season,
            episode,
        } => {
            let params = routes_stream::StreamParams {
                kind,
                season,
                episode,
            };
            resolve(&content_id, &params, cli.config.as_deref())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("hlsrelay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn resolve(
    content_id: &str,
    params: &routes_stream::StreamParams,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let request = routes_stream::parse_stream_request(content_id, params)?;

    let results = ResultCache::new(config.resolver.result_ttl_secs);
    let manifests = ManifestCache::new(config.relay.manifest_ttl_secs);
    let resolver = Resolver::from_config(&config, results, manifests);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(resolver.resolve(&request));

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(path)?;

    println!("Configuration is valid!");
    println!();
    println!("Server: {}:{}", config.server.host, config.server.port);
    if !config.server.public_url.is_empty() {
        println!("Public URL: {}", config.server.public_url);
    }
    println!("Result TTL: {}s", config.resolver.result_ttl_secs);
    println!("Manifest TTL: {}s", config.relay.manifest_ttl_secs);
    println!();
    println!("Tiers:");
    let worker = if config.worker.enabled {
        format!(
            "enabled ({} {}, {}s timeout)",
            config.worker.program,
            config.worker.args.join(" "),
            config.worker.timeout_secs
        )
    } else {
        "disabled".to_string()
    };
    println!("  1. worker: {}", worker);
    let remote = if config.remote.enabled {
        format!("enabled ({})", config.remote.url)
    } else {
        "disabled".to_string()
    };
    println!("  2. remote: {}", remote);
    println!(
        "  3. scrape: {}",
        if config.scraper.enabled { "enabled" } else { "disabled" }
    );
    println!("Embed fallback: {}", config.resolver.embed_base_url);

    Ok(())
}
