//! Core type definitions for stream requests and resolution results.
//!
//! Enums serialize in lowercase, matching the JSON returned to players and the
//! arguments handed to extraction agents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of catalog content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A single movie.
    Movie,
    /// An episode of a TV series.
    #[serde(alias = "tv")]
    Series,
}

impl ContentKind {
    /// Name used by extraction agents and embed URLs (`movie` / `tv`).
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "tv",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Series => write!(f, "series"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" => Ok(Self::Movie),
            "series" | "tv" | "show" => Ok(Self::Series),
            _ => Err(format!("Unknown content kind: {}", s)),
        }
    }
}

/// Identifies the unit of content to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamRequest {
    /// Catalog (TMDB) identifier.
    pub catalog_id: u64,
    /// Movie or series.
    pub kind: ContentKind,
    /// Season number, series only.
    pub season: Option<u32>,
    /// Episode number, series only.
    pub episode: Option<u32>,
}

impl StreamRequest {
    /// Build a request, normalizing season/episode for the given kind.
    ///
    /// Movies never carry season/episode. Series default both to 1.
    pub fn new(catalog_id: u64, kind: ContentKind, season: Option<u32>, episode: Option<u32>) -> Self {
        match kind {
            ContentKind::Movie => Self {
                catalog_id,
                kind,
                season: None,
                episode: None,
            },
            ContentKind::Series => Self {
                catalog_id,
                kind,
                season: Some(season.unwrap_or(1)),
                episode: Some(episode.unwrap_or(1)),
            },
        }
    }

    /// Request for a movie.
    pub fn movie(catalog_id: u64) -> Self {
        Self::new(catalog_id, ContentKind::Movie, None, None)
    }

    /// Request for one episode of a series.
    pub fn episode(catalog_id: u64, season: u32, episode: u32) -> Self {
        Self::new(catalog_id, ContentKind::Series, Some(season), Some(episode))
    }

    /// Deterministic key shared by the result and manifest caches.
    ///
    /// The key is URL-safe so it can be used directly as a manifest id.
    /// A missing season or episode keys as 1, matching what the tiers request.
    pub fn cache_key(&self) -> String {
        match self.kind {
            ContentKind::Series => format!(
                "series-{}-s{}e{}",
                self.catalog_id,
                self.season.unwrap_or(1),
                self.episode.unwrap_or(1)
            ),
            ContentKind::Movie => format!("movie-{}", self.catalog_id),
        }
    }
}

impl fmt::Display for StreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// How the resolved stream should be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    /// A playable HLS stream relayed through this service.
    Direct,
    /// An embeddable player page (fallback).
    Embed,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Embed => write!(f, "embed"),
        }
    }
}

/// A subtitle track discovered alongside a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Absolute URL of the subtitle file.
    pub url: String,
    /// Language code (`unknown` when the extractor could not tell).
    #[serde(alias = "lang", default = "default_language")]
    pub language: String,
    /// File format (`vtt` or `srt`).
    #[serde(default)]
    pub format: String,
}

fn default_language() -> String {
    "unknown".to_string()
}

/// Outcome of resolving a [`StreamRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Direct relay stream or embed fallback.
    pub stream_type: StreamType,
    /// URL the client should load.
    pub proxy_url: String,
    /// Which tier (and domain) produced the result.
    pub source: String,
    /// Subtitle tracks, in extractor order.
    pub subtitles: Vec<SubtitleTrack>,
    /// Upstream manifest URL (or embed URL for fallbacks).
    pub original_url: String,
    /// Referer to present upstream.
    pub referer: String,
}

impl ExtractionResult {
    /// Embed fallback pointing at a player page.
    pub fn embed(embed_url: impl Into<String>, source: impl Into<String>) -> Self {
        let embed_url = embed_url.into();
        Self {
            stream_type: StreamType::Embed,
            proxy_url: embed_url.clone(),
            source: source.into(),
            subtitles: Vec::new(),
            original_url: embed_url,
            referer: String::new(),
        }
    }

    /// Whether this is a relayed HLS stream.
    pub fn is_direct(&self) -> bool {
        self.stream_type == StreamType::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_kind_parsing() {
        assert_eq!("movie".parse::<ContentKind>().unwrap(), ContentKind::Movie);
        assert_eq!("TV".parse::<ContentKind>().unwrap(), ContentKind::Series);
        assert_eq!("series".parse::<ContentKind>().unwrap(), ContentKind::Series);
        assert!("anime".parse::<ContentKind>().is_err());
    }

    #[test]
    fn content_kind_serde_accepts_tv_alias() {
        let kind: ContentKind = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(kind, ContentKind::Series);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"series\"");
    }

    #[test]
    fn movie_requests_drop_episode_fields() {
        let req = StreamRequest::new(550, ContentKind::Movie, Some(2), Some(3));
        assert_eq!(req, StreamRequest::movie(550));
        assert_eq!(req.cache_key(), "movie-550");
    }

    #[test]
    fn series_requests_default_to_first_episode() {
        let req = StreamRequest::new(1396, ContentKind::Series, None, None);
        assert_eq!(req.season, Some(1));
        assert_eq!(req.episode, Some(1));
        assert_eq!(req.cache_key(), "series-1396-s1e1");
    }

    #[test]
    fn equal_requests_share_a_key() {
        let a = StreamRequest::episode(1396, 2, 5);
        let b = StreamRequest::new(1396, ContentKind::Series, Some(2), Some(5));
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), StreamRequest::episode(1396, 5, 2).cache_key());
    }

    #[test]
    fn hand_built_series_keys_like_first_episode() {
        let bare = StreamRequest {
            catalog_id: 1396,
            kind: ContentKind::Series,
            season: None,
            episode: None,
        };
        assert_eq!(bare.cache_key(), "series-1396-s1e1");
        assert_eq!(bare.cache_key(), StreamRequest::episode(1396, 1, 1).cache_key());

        let movie_with_episode = StreamRequest {
            catalog_id: 550,
            kind: ContentKind::Movie,
            season: Some(2),
            episode: None,
        };
        assert_eq!(movie_with_episode.cache_key(), "movie-550");
    }

    #[test]
    fn subtitle_track_accepts_lang_alias() {
        let track: SubtitleTrack =
            serde_json::from_str(r#"{"url":"https://s.example/en.vtt","lang":"en","format":"vtt"}"#)
                .unwrap();
        assert_eq!(track.language, "en");

        let bare: SubtitleTrack = serde_json::from_str(r#"{"url":"https://s.example/x.vtt"}"#).unwrap();
        assert_eq!(bare.language, "unknown");
        assert_eq!(bare.format, "");
    }

    #[test]
    fn embed_result_points_at_embed_url() {
        let result = ExtractionResult::embed("https://embed.example/movie/550", "embed");
        assert_eq!(result.stream_type, StreamType::Embed);
        assert_eq!(result.proxy_url, "https://embed.example/movie/550");
        assert!(!result.is_direct());
    }
}
