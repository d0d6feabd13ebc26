//! Tier 3: scrape the embed page for a manifest URL.

use super::tier::{ExtractionTier, TierError};
use super::EmbedUrls;
use crate::config::ScraperConfig;
use hlsrelay_common::{ExtractionResult, StreamRequest, StreamType};
use hlsrelay_media::RelayUrls;
use regex::Regex;
use reqwest::{header, Client};
use std::sync::LazyLock;
use std::time::Duration;

static MANIFEST_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>\\]+?\.m3u8(?:\?[^\s"'<>\\]*)?"#)
        .expect("manifest url regex should compile")
});

/// First absolute `.m3u8` URL in a page, with JavaScript `\/` escapes undone.
pub fn find_manifest_url(html: &str) -> Option<String> {
    let unescaped = html.replace("\\/", "/");
    MANIFEST_URL_REGEX
        .find(&unescaped)
        .map(|m| m.as_str().to_string())
}

/// Last-resort scraper over the canonical embed page.
pub struct ScrapeTier {
    client: Client,
    embeds: EmbedUrls,
    urls: RelayUrls,
}

impl ScrapeTier {
    pub fn new(config: &ScraperConfig, user_agent: &str, embeds: EmbedUrls, urls: RelayUrls) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            embeds,
            urls,
        }
    }
}

#[async_trait::async_trait]
impl ExtractionTier for ScrapeTier {
    fn name(&self) -> &str {
        "scrape"
    }

    async fn extract(&self, request: &StreamRequest) -> Result<ExtractionResult, TierError> {
        let page_url = self.embeds.url_for(request);

        let response = self
            .client
            .get(&page_url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| TierError::unavailable(format!("embed page unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(TierError::failed(format!(
                "embed page returned {}",
                response.status().as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| TierError::failed(format!("failed to read embed page: {e}")))?;

        let hls_url = find_manifest_url(&html)
            .ok_or_else(|| TierError::no_stream("no manifest URL in embed page"))?;

        tracing::debug!(url = %hls_url, "Found manifest URL in embed page");

        Ok(ExtractionResult {
            stream_type: StreamType::Direct,
            proxy_url: self.urls.proxy_url(&hls_url, &page_url),
            source: "scrape".to_string(),
            subtitles: Vec::new(),
            original_url: hls_url,
            referer: page_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn finds_plain_and_escaped_urls() {
        let html = r#"<script>var cfg = {"file":"https:\/\/cdn.example\/hls\/master.m3u8?t=abc","poster":"x.jpg"};</script>"#;
        assert_eq!(
            find_manifest_url(html).as_deref(),
            Some("https://cdn.example/hls/master.m3u8?t=abc")
        );

        let html = "<source src='https://cdn.example/a.m3u8' type='application/x-mpegURL'>";
        assert_eq!(
            find_manifest_url(html).as_deref(),
            Some("https://cdn.example/a.m3u8")
        );
    }

    #[test]
    fn first_match_wins_and_absence_is_none() {
        let html = "https://one.example/1.m3u8 https://two.example/2.m3u8";
        assert_eq!(
            find_manifest_url(html).as_deref(),
            Some("https://one.example/1.m3u8")
        );
        assert!(find_manifest_url("<video src=\"/relative.m3u8\">").is_none());
        assert!(find_manifest_url("https://cdn.example/video.mp4").is_none());
    }

    #[tokio::test]
    async fn scrapes_embed_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/embed/movie/550"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><script>src:'https://cdn.example/550/index.m3u8'</script></html>"),
            )
            .mount(&server)
            .await;

        let tier = ScrapeTier::new(
            &ScraperConfig::default(),
            "test-agent",
            EmbedUrls::new(format!("{}/embed", server.uri())),
            RelayUrls::default(),
        );
        let result = tier.extract(&StreamRequest::movie(550)).await.unwrap();

        assert_eq!(result.source, "scrape");
        assert_eq!(result.original_url, "https://cdn.example/550/index.m3u8");
        assert_eq!(result.referer, format!("{}/embed/movie/550", server.uri()));
        assert!(result.proxy_url.starts_with("/relay/proxy?url="));
    }

    #[tokio::test]
    async fn page_without_manifest_is_no_stream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let tier = ScrapeTier::new(
            &ScraperConfig::default(),
            "test-agent",
            EmbedUrls::new(format!("{}/embed", server.uri())),
            RelayUrls::default(),
        );
        let result = tier.extract(&StreamRequest::movie(550)).await;
        assert_matches!(result, Err(TierError::NoStream(_)));
    }
}
