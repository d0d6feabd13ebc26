//! The extraction strategy interface.

use hlsrelay_common::{ExtractionResult, StreamRequest};

/// Why a tier produced no result.
///
/// These never reach a client. The resolver logs them and moves on to the
/// next tier.
#[derive(Debug, thiserror::Error)]
pub enum TierError {
    /// The tier cannot run right now (gate busy, disabled, timed out).
    #[error("tier unavailable: {0}")]
    Unavailable(String),

    /// The tier ran and failed (bad exit, bad response, transport error).
    #[error("tier failed: {0}")]
    Failed(String),

    /// The tier ran but found no usable manifest URL.
    #[error("no usable stream: {0}")]
    NoStream(String),
}

impl TierError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn failed<S: Into<String>>(msg: S) -> Self {
        Self::Failed(msg.into())
    }

    pub fn no_stream<S: Into<String>>(msg: S) -> Self {
        Self::NoStream(msg.into())
    }
}

/// One way of turning a [`StreamRequest`] into a playable stream.
#[async_trait::async_trait]
pub trait ExtractionTier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether the tier is expensive enough to be serialized through the
    /// single-flight gate.
    fn single_flight(&self) -> bool {
        false
    }

    /// Attempt one extraction.
    async fn extract(&self, request: &StreamRequest) -> Result<ExtractionResult, TierError>;
}

/// Whether `url` is usable as an upstream manifest location.
pub(crate) fn is_usable_stream_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("https://") || url.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_urls_are_absolute_http() {
        assert!(is_usable_stream_url("https://x.example/master.m3u8"));
        assert!(is_usable_stream_url("http://x.example/master.m3u8"));
        assert!(!is_usable_stream_url(""));
        assert!(!is_usable_stream_url("variant/low.m3u8"));
        assert!(!is_usable_stream_url("blob:https://x.example/abc"));
    }
}
