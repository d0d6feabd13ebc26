//! HLS playlist rewriting.
//!
//! This module turns third-party M3U8 playlists into playlists whose media
//! URIs point back at the relay.

mod manifest;
mod rewrite;
mod urls;

pub use manifest::{
    is_manifest_content_type, is_manifest_url, is_uri_line, manifest_base_url, resolve_uri,
    MANIFEST_CONTENT_TYPE,
};
pub use rewrite::ManifestRewriter;
pub use urls::{origin_of, RelayUrls};
