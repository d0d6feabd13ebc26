//! Hlsrelay-Media: HLS manifest handling for the relay.
//!
//! This crate knows just enough about M3U8 playlists to relay them through a
//! proxy without understanding their media semantics.
//!
//! # Modules
//!
//! - `hls` - URI line detection, relative URI resolution, relay URL encoding
//!   and manifest rewriting
//!
//! # Architecture
//!
//! A playlist is treated as a sequence of lines. Tag, comment and blank lines
//! are carried through verbatim. Every other line is a URI reference: it is
//! resolved against the directory of the playlist it came from and replaced by
//! a relay proxy URL that carries the absolute target and the referer the
//! upstream expects. Line order and line count never change, so the output is
//! always a structurally valid playlist.

pub mod hls;

pub use hls::{ManifestRewriter, RelayUrls};
