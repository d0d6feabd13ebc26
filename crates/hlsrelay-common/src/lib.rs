//! Hlsrelay-Common: Shared types and errors.
//!
//! This crate provides the vocabulary shared by the resolver, the relay and
//! the HTTP layer:
//!
//! - **Requests**: [`StreamRequest`] and its deterministic cache key
//! - **Results**: [`ExtractionResult`], [`StreamType`] and [`SubtitleTrack`]
//! - **Error Handling**: Common error type with HTTP status mapping
//!
//! # Examples
//!
//! ```
//! use hlsrelay_common::{ContentKind, StreamRequest};
//!
//! let request = StreamRequest::movie(550);
//! assert_eq!(request.kind, ContentKind::Movie);
//! assert_eq!(request.cache_key(), "movie-550");
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
