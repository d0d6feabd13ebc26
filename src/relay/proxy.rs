//! Relay handlers.

use super::RelayState;
use crate::server::AppError;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use hlsrelay_common::Error;
use hlsrelay_media::hls::{
    is_manifest_content_type, is_manifest_url, manifest_base_url, origin_of,
    MANIFEST_CONTENT_TYPE,
};
use serde::Deserialize;

/// Upstream response headers copied onto relayed segments.
const PASSTHROUGH_HEADERS: [&str; 6] = [
    "content-type",
    "content-length",
    "content-range",
    "accept-ranges",
    "last-modified",
    "etag",
];

const EXPOSED_HEADERS: &str = "Content-Length, Content-Range, Accept-Ranges";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
    pub referer: Option<String>,
}

fn cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );
}

fn manifest_response(body: String) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(MANIFEST_CONTENT_TYPE),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    cors_headers(headers);
    response
}

/// `GET /relay/manifest/:id`: a captured playlist, rewritten on every fetch.
pub async fn serve_manifest(
    State(relay): State<RelayState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let entry = relay
        .manifests
        .get(&id)
        .ok_or_else(|| Error::not_found(format!("stream {id} expired or unknown, resolve again")))?;

    let body = relay
        .rewriter
        .rewrite(&entry.body, &entry.base_url, &entry.referer);

    tracing::debug!(id = %id, bytes = body.len(), "Served cached manifest");
    Ok(manifest_response(body))
}

/// `OPTIONS /relay/proxy`: CORS preflight.
pub async fn options_preflight() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    cors_headers(&mut headers);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Range, Content-Type, Origin, Accept"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    (StatusCode::NO_CONTENT, headers)
}

fn validate_target(target: Option<String>) -> Result<String, Error> {
    let target = target
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::invalid_input("missing url parameter"))?;

    let parsed = url::Url::parse(&target)
        .map_err(|e| Error::invalid_input(format!("invalid url {target}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(target),
        other => Err(Error::invalid_input(format!("unsupported scheme {other}"))),
    }
}

/// `GET /relay/proxy?url=..&referer=..`: fetch an upstream playlist or segment.
///
/// Playlists come back rewritten. Everything else is streamed through with
/// its status and range headers intact.
pub async fn proxy_passthrough(
    State(relay): State<RelayState>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let target = validate_target(query.url)?;
    let referer = query
        .referer
        .map(|r| r.trim().to_string())
        .unwrap_or_default();

    let mut request = relay.client.get(&target).header("Accept", "*/*");
    if !referer.is_empty() {
        request = request.header("Referer", referer.as_str());
        if let Some(origin) = origin_of(&referer) {
            request = request.header("Origin", origin.trim_end_matches('/'));
        }
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(range) = &range {
        request = request.header("Range", range.as_str());
    }

    let upstream = match tokio::time::timeout(relay.request_timeout, request.send()).await {
        Ok(Ok(upstream)) => upstream,
        Ok(Err(e)) => {
            tracing::warn!(url = %target, "Upstream fetch failed: {}", e);
            return Err(Error::unreachable(format!("{target}: {e}")).into());
        }
        Err(_) => {
            tracing::warn!(url = %target, timeout = ?relay.request_timeout, "Upstream did not respond in time");
            return Err(Error::unreachable(format!(
                "{target}: no response within {:?}",
                relay.request_timeout
            ))
            .into());
        }
    };

    let status = upstream.status().as_u16();
    if !upstream.status().is_success() {
        tracing::warn!(url = %target, status, "Upstream returned error status");
        return Err(Error::upstream(status, format!("fetch of {target} failed")).into());
    }

    let final_url = upstream.url().to_string();
    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if is_manifest_url(&target) || is_manifest_url(&final_url) || is_manifest_content_type(&content_type) {
        let text = tokio::time::timeout(relay.request_timeout, upstream.text())
            .await
            .map_err(|_| Error::unreachable(format!("reading {target}: timed out")))?
            .map_err(|e| Error::unreachable(format!("reading {target}: {e}")))?;
        let body = relay
            .rewriter
            .rewrite(&text, &manifest_base_url(&final_url), &referer);
        tracing::debug!(url = %target, bytes = body.len(), "Relayed manifest");
        return Ok(manifest_response(body));
    }

    tracing::trace!(url = %target, status, range = ?range, "Relaying segment");

    let mut builder = Response::builder()
        .status(StatusCode::from_u16(status).unwrap_or(StatusCode::OK));
    for name in PASSTHROUGH_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                builder = builder.header(name, value);
            }
        }
    }

    let log_url = target.clone();
    let stream = upstream.bytes_stream().inspect_err(move |e| {
        tracing::warn!(url = %log_url, "Upstream stream interrupted: {}", e);
    });

    let mut response = builder
        .body(Body::from_stream(stream))
        .map_err(|e| Error::internal(format!("building relay response: {e}")))?;
    cors_headers(response.headers_mut());
    Ok(response)
}
