//! Relay URL construction.

use url::form_urlencoded;
use url::Url;

/// Builds URLs that route playback back through the relay.
///
/// With an empty prefix the URLs are same-origin relative paths, which players
/// resolve against whatever host served the playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayUrls {
    prefix: String,
}

impl RelayUrls {
    /// Create a builder for the given public base URL (may be empty).
    pub fn new(public_url: impl Into<String>) -> Self {
        let prefix = public_url.into().trim_end_matches('/').to_string();
        Self { prefix }
    }

    /// Pass-through proxy URL for an upstream target.
    pub fn proxy_url(&self, target: &str, referer: &str) -> String {
        let mut url = format!("{}/relay/proxy?url={}", self.prefix, encode(target));
        if !referer.is_empty() {
            url.push_str("&referer=");
            url.push_str(&encode(referer));
        }
        url
    }

    /// URL of a cached manifest.
    pub fn manifest_url(&self, id: &str) -> String {
        format!("{}/relay/manifest/{}", self.prefix, id)
    }

    /// Whether `url` is a cached-manifest URL produced by this builder.
    ///
    /// Returns the manifest id when it is.
    pub fn manifest_id<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.prefix.as_str())?
            .strip_prefix("/relay/manifest/")
    }
}

/// Origin of a URL with a trailing slash, e.g. `https://x.example/`.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    match parsed.origin() {
        origin @ url::Origin::Tuple(..) => Some(format!("{}/", origin.ascii_serialization())),
        url::Origin::Opaque(_) => None,
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
