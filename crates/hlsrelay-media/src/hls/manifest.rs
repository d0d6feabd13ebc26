//! Line classification and URI resolution for M3U8 playlists.

use url::Url;

/// Media type served for every relayed playlist.
pub const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Whether a playlist line is a URI reference.
///
/// Anything non-empty that is not a tag or comment (`#...`) is a URI.
pub fn is_uri_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// Whether a URL points at a playlist, judged by its path suffix.
pub fn is_manifest_url(url: &str) -> bool {
    let path = strip_query(url).to_ascii_lowercase();
    path.ends_with(".m3u8") || path.ends_with(".m3u")
}

/// Whether a `Content-Type` value denotes an HLS playlist.
///
/// Covers `application/vnd.apple.mpegurl`, `application/x-mpegurl` and
/// `audio/mpegurl`.
pub fn is_manifest_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("mpegurl")
}

/// Directory of a playlist URL, always ending in `/`.
///
/// Query and fragment are dropped, then the last path segment is removed.
pub fn manifest_base_url(manifest_url: &str) -> String {
    if let Ok(mut url) = Url::parse(manifest_url) {
        url.set_query(None);
        url.set_fragment(None);
        let s = url.as_str();
        return match s.rfind('/') {
            Some(idx) if idx + 1 > scheme_end(s) => s[..=idx].to_string(),
            _ => format!("{}/", s),
        };
    }

    // Not an absolute URL; fall back to plain string handling.
    let path = strip_query(manifest_url);
    match path.rfind('/') {
        Some(idx) => path[..=idx].to_string(),
        None => String::new(),
    }
}

/// Resolve a playlist URI against the playlist's base URL.
///
/// Absolute URIs are returned unchanged. Scheme-relative (`//host/x`) and
/// root-relative (`/x`) URIs take the scheme or origin of the base; all other
/// relative URIs are appended to the base directory.
pub fn resolve_uri(uri: &str, base_url: &str) -> String {
    let uri = uri.trim();
    if has_scheme(uri) {
        return uri.to_string();
    }

    if let Some(rest) = uri.strip_prefix("//") {
        let scheme = base_url.split("://").next().unwrap_or("https");
        return format!("{}://{}", scheme, rest);
    }

    if uri.starts_with('/') {
        if let Ok(base) = Url::parse(base_url) {
            return format!("{}{}", base.origin().ascii_serialization(), uri);
        }
    }

    format!("{}{}", base_url, uri)
}

fn has_scheme(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

fn scheme_end(s: &str) -> usize {
    s.find("://").map(|i| i + 3).unwrap_or(0)
}
