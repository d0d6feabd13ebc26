mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./hlsrelay.toml",
        "~/.config/hlsrelay/config.toml",
        "/etc/hlsrelay/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.resolver.result_ttl_secs == 0 {
        anyhow::bail!("resolver.result_ttl_secs must be greater than 0");
    }

    if config.relay.manifest_ttl_secs == 0 {
        anyhow::bail!("relay.manifest_ttl_secs must be greater than 0");
    }

    if config.worker.enabled && config.worker.program.trim().is_empty() {
        anyhow::bail!("Worker is enabled but has no program");
    }

    if config.remote.enabled && config.remote.url.trim().is_empty() {
        anyhow::bail!("Remote extraction is enabled but has no url");
    }

    if !config.worker.enabled && !config.remote.enabled && !config.scraper.enabled {
        tracing::warn!("All extraction tiers are disabled; every request will fall back to embed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.resolver.result_ttl_secs, 300);
        assert_eq!(config.worker.timeout_secs, 90);
        assert!(config.worker.enabled);
        assert!(!config.remote.enabled);
        assert!(config.scraper.enabled);
        assert_eq!(config.relay.manifest_ttl_secs, 600);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let file = write_config(
            r#"
[server]
port = 9000
public_url = "https://relay.example"

[remote]
enabled = true
url = "https://extractor.example"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.public_url, "https://relay.example");
        assert!(config.remote.enabled);
        assert_eq!(config.remote.timeout_secs, 30);
    }

    #[test]
    fn rejects_zero_port() {
        let file = write_config("[server]\nport = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_remote_without_url() {
        let file = write_config("[remote]\nenabled = true\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("no url"));
    }

    #[test]
    fn rejects_zero_ttl() {
        let file = write_config("[resolver]\nresult_ttl_secs = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/hlsrelay.toml")).is_err());
    }
}
