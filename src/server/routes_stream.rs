//! Stream resolution route.

use super::{AppContext, AppError};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use hlsrelay_common::{ContentKind, Error, StreamRequest, StreamType, SubtitleTrack};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    /// `movie`, `series` or `tv`
    pub kind: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamResponse {
    pub stream_url: String,
    pub stream_type: StreamType,
    pub subtitles: Vec<SubtitleTrack>,
    pub source: String,
}

pub fn stream_routes() -> Router<AppContext> {
    Router::new().route("/stream/:content_id", get(get_stream))
}

/// Build a [`StreamRequest`] from the path id and query parameters.
///
/// Without an explicit kind, the presence of a season or episode makes the
/// request a series request.
pub fn parse_stream_request(content_id: &str, params: &StreamParams) -> Result<StreamRequest, Error> {
    let catalog_id: u64 = content_id
        .trim()
        .parse()
        .map_err(|_| Error::invalid_input(format!("content id must be numeric, got {content_id:?}")))?;

    let kind = match params.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(kind) => kind.parse::<ContentKind>().map_err(Error::invalid_input)?,
        None if params.season.is_some() || params.episode.is_some() => ContentKind::Series,
        None => ContentKind::Movie,
    };

    Ok(StreamRequest::new(catalog_id, kind, params.season, params.episode))
}

async fn get_stream(
    State(ctx): State<AppContext>,
    Path(content_id): Path<String>,
    Query(params): Query<StreamParams>,
) -> Result<Json<StreamResponse>, AppError> {
    let request = parse_stream_request(&content_id, &params)?;
    let result = ctx.resolver.resolve(&request).await;

    Ok(Json(StreamResponse {
        stream_url: result.proxy_url,
        stream_type: result.stream_type,
        subtitles: result.subtitles,
        source: result.source,
    }))
}
