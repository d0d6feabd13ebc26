//! hlsrelay - tiered stream resolver and HLS relay proxy
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod relay;
pub mod resolver;
pub mod server;
