//! Common error types used throughout hlsrelay.
//!
//! Only the relay layer and request parsing surface these to clients.
//! Extraction tiers have their own failure type that never leaves the resolver.

/// Common error type for hlsrelay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested resource was not found (or has expired).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The upstream answered with a non-success status.
    #[error("Upstream returned {status}: {message}")]
    Upstream {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Short description of the failed fetch.
        message: String,
    },

    /// The upstream could not be reached at all.
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Upstream error.
    pub fn upstream<S: Into<String>>(status: u16, msg: S) -> Self {
        Self::Upstream {
            status,
            message: msg.into(),
        }
    }

    /// Create a new UpstreamUnreachable error.
    pub fn unreachable<S: Into<String>>(msg: S) -> Self {
        Self::UpstreamUnreachable(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status code this error maps to.
    ///
    /// Upstream error statuses are preserved when they are real error codes;
    /// anything else becomes 502 Bad Gateway.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::Upstream { status, .. } if (400..600).contains(status) => *status,
            Self::Upstream { .. } | Self::UpstreamUnreachable(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Upstream { .. } => "upstream_error",
            Self::UpstreamUnreachable(_) => "upstream_unreachable",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
