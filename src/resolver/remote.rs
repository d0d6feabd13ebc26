//! Tier 2: a remotely hosted extraction service.
//!
//! The service scrapes several upstream domains at once and answers
//! `GET {base}/extract?tmdb_id=..&type=movie|tv[&season=..&episode=..]` with
//! `{success, results: {<domain>: {hls_url, referer, subtitles}}}`.

use super::tier::{is_usable_stream_url, ExtractionTier, TierError};
use crate::config::RemoteConfig;
use hlsrelay_common::{ContentKind, ExtractionResult, StreamRequest, StreamType, SubtitleTrack};
use hlsrelay_media::hls::origin_of;
use hlsrelay_media::RelayUrls;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    success: bool,
    /// Domain -> result, in the order the service listed them.
    #[serde(default)]
    results: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DomainResult {
    #[serde(default)]
    hls_url: Option<String>,
    #[serde(default)]
    referer: Option<String>,
    #[serde(default)]
    subtitles: Vec<SubtitleTrack>,
}

/// Client for the remote extraction service.
pub struct RemoteTier {
    client: Client,
    base_url: String,
    urls: RelayUrls,
}

impl RemoteTier {
    pub fn new(config: &RemoteConfig, urls: RelayUrls) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            urls,
        }
    }

    fn query(request: &StreamRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("tmdb_id", request.catalog_id.to_string()),
            ("type", request.kind.provider_name().to_string()),
        ];
        if request.kind == ContentKind::Series {
            query.push(("season", request.season.unwrap_or(1).to_string()));
            query.push(("episode", request.episode.unwrap_or(1).to_string()));
        }
        query
    }

    /// Pick the first domain that produced a usable manifest URL.
    fn select(&self, response: ExtractResponse) -> Result<ExtractionResult, TierError> {
        if !response.success {
            return Err(TierError::failed(
                response
                    .error
                    .unwrap_or_else(|| "remote service reported failure".to_string()),
            ));
        }

        for (domain, value) in response.results {
            let Ok(found) = serde_json::from_value::<DomainResult>(value) else {
                tracing::debug!(domain = %domain, "Skipping malformed domain result");
                continue;
            };

            let Some(hls_url) = found
                .hls_url
                .map(|u| u.trim().to_string())
                .filter(|u| is_usable_stream_url(u))
            else {
                continue;
            };

            let referer = found
                .referer
                .filter(|r| !r.trim().is_empty())
                .or_else(|| origin_of(&hls_url))
                .unwrap_or_default();

            return Ok(ExtractionResult {
                stream_type: StreamType::Direct,
                proxy_url: self.urls.proxy_url(&hls_url, &referer),
                source: format!("remote:{}", domain),
                subtitles: found
                    .subtitles
                    .into_iter()
                    .filter(|s| !s.url.trim().is_empty())
                    .collect(),
                original_url: hls_url,
                referer,
            });
        }

        Err(TierError::no_stream("no domain returned a manifest URL"))
    }
}

#[async_trait::async_trait]
impl ExtractionTier for RemoteTier {
    fn name(&self) -> &str {
        "remote"
    }

    async fn extract(&self, request: &StreamRequest) -> Result<ExtractionResult, TierError> {
        let url = format!("{}/extract", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&Self::query(request))
            .send()
            .await
            .map_err(|e| TierError::unavailable(format!("remote service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(TierError::failed(format!(
                "remote service returned {}",
                response.status().as_u16()
            )));
        }

        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|e| TierError::failed(format!("invalid remote response: {e}")))?;

        self.select(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tier(url: &str) -> RemoteTier {
        let config = RemoteConfig {
            enabled: true,
            url: url.to_string(),
            timeout_secs: 5,
        };
        RemoteTier::new(&config, RelayUrls::default())
    }

    #[test]
    fn first_usable_domain_wins_in_response_order() {
        let body: ExtractResponse = serde_json::from_str(
            r#"{
                "success": true,
                "results": {
                    "zeta.example": {"hls_url": ""},
                    "beta.example": {"hls_url": "https://b.example/master.m3u8", "referer": "https://beta.example/"},
                    "alpha.example": {"hls_url": "https://a.example/master.m3u8"}
                }
            }"#,
        )
        .unwrap();

        let result = tier("http://unused").select(body).unwrap();
        assert_eq!(result.source, "remote:beta.example");
        assert_eq!(result.original_url, "https://b.example/master.m3u8");
        assert_eq!(result.referer, "https://beta.example/");
    }

    #[test]
    fn unsuccessful_or_empty_is_an_error() {
        let failed: ExtractResponse =
            serde_json::from_str(r#"{"success": false, "error": "blocked"}"#).unwrap();
        assert_matches!(
            tier("http://unused").select(failed),
            Err(TierError::Failed(_))
        );

        let empty: ExtractResponse =
            serde_json::from_str(r#"{"success": true, "results": {}}"#).unwrap();
        assert_matches!(
            tier("http://unused").select(empty),
            Err(TierError::NoStream(_))
        );
    }

    #[tokio::test]
    async fn calls_extract_endpoint_with_series_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/extract"))
            .and(query_param("tmdb_id", "1396"))
            .and(query_param("type", "tv"))
            .and(query_param("season", "2"))
            .and(query_param("episode", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "results": {
                    "cdn.example": {
                        "hls_url": "https://cdn.example/s2e3/index.m3u8",
                        "subtitles": [{"url": "https://cdn.example/en.vtt", "lang": "en", "format": "vtt"}]
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = tier(&server.uri())
            .extract(&StreamRequest::episode(1396, 2, 3))
            .await
            .unwrap();

        assert_eq!(result.stream_type, StreamType::Direct);
        assert_eq!(result.referer, "https://cdn.example/");
        assert_eq!(result.subtitles.len(), 1);
        assert_eq!(result.subtitles[0].language, "en");
    }

    #[tokio::test]
    async fn server_error_is_tier_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/extract"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = tier(&server.uri()).extract(&StreamRequest::movie(550)).await;
        assert_matches!(result, Err(TierError::Failed(_)));
    }
}
