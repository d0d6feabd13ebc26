//! Manifest URI rewriting.

use super::manifest::{is_uri_line, resolve_uri};
use super::urls::RelayUrls;

/// Rewrites playlist URI lines into relay proxy URLs.
///
/// Tag, comment and blank lines pass through byte for byte. Line order and
/// line count are preserved, including a trailing newline and `\r\n` endings.
#[derive(Debug, Clone, Default)]
pub struct ManifestRewriter {
    urls: RelayUrls,
}

impl ManifestRewriter {
    /// Create a rewriter emitting URLs from the given builder.
    pub fn new(urls: RelayUrls) -> Self {
        Self { urls }
    }

    /// The URL builder used for substituted lines.
    pub fn urls(&self) -> &RelayUrls {
        &self.urls
    }

    /// Rewrite `body`, resolving relative URIs against `base_url`.
    ///
    /// `referer` is encoded into every proxy URL so segment fetches present
    /// the same referer as the playlist fetch.
    pub fn rewrite(&self, body: &str, base_url: &str, referer: &str) -> String {
        let mut out = String::with_capacity(body.len() * 2);

        for (i, line) in body.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }

            let (content, line_end) = match line.strip_suffix('\r') {
                Some(content) => (content, "\r"),
                None => (line, ""),
            };

            if is_uri_line(content) {
                let target = resolve_uri(content, base_url);
                out.push_str(&self.urls.proxy_url(&target, referer));
                out.push_str(line_end);
            } else {
                out.push_str(line);
            }
        }

        out
    }
}
