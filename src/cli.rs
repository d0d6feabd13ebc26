use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hlsrelay")]
#[command(author, version, about = "Tiered stream resolver and HLS relay proxy")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the resolver and relay HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Resolve one title through the extraction tiers and print the result
    Resolve {
        /// Catalog (TMDB) id
        content_id: String,

        /// movie, series or tv
        #[arg(long)]
        kind: Option<String>,

        /// Season number (implies series)
        #[arg(long)]
        season: Option<u32>,

        /// Episode number (implies series)
        #[arg(long)]
        episode: Option<u32>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
