//! Firecrawl content extraction adapter

use super::{build_client, send_json, AdapterResult, ContentCrawler};
use crate::config::CrawlConfig;
use crate::error::{AdapterFailure, Result};
use crate::models::{CrawlResult, LinkGraph};
use crate::parse::{count_words, is_internal, parse_page};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 3],
    only_main_content: bool,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    html: Option<String>,
    links: Option<Vec<String>>,
    #[serde(default)]
    metadata: ScrapeMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeMetadata {
    title: Option<String>,
    description: Option<String>,
}

/// Firecrawl `/v1/scrape` client
pub struct FirecrawlClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl FirecrawlClient {
    pub fn new(config: &CrawlConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: format!("{}/v1/scrape", config.endpoint.trim_end_matches('/')),
            api_key,
        })
    }
}

fn into_crawl_result(url: &str, data: ScrapeData) -> CrawlResult {
    let page = data.html.as_deref().map(|html| parse_page(html, url));

    let word_count = match (&data.markdown, &page) {
        (Some(markdown), _) => count_words(markdown),
        (None, Some(page)) => page.word_count,
        (None, None) => 0,
    };

    let links = match data.links {
        Some(raw) => {
            let base = Url::parse(url).ok();
            let mut graph = LinkGraph::default();
            for link in raw {
                if is_internal(&link, base.as_ref()) {
                    graph.internal.push(link);
                } else {
                    graph.external.push(link);
                }
            }
            graph
        }
        None => page.as_ref().map(|p| p.links.clone()).unwrap_or_default(),
    };

    let images = page.as_ref().map(|p| p.image_sources.clone()).unwrap_or_default();

    CrawlResult {
        url: url.to_string(),
        word_count,
        images,
        links,
        title: data.metadata.title.or_else(|| page.as_ref().and_then(|p| p.title.clone())),
        description: data
            .metadata
            .description
            .or_else(|| page.and_then(|p| p.meta_description)),
    }
}

#[async_trait]
impl ContentCrawler for FirecrawlClient {
    async fn scrape(&self, url: &str) -> AdapterResult<CrawlResult> {
        debug!(url, "Scraping with Firecrawl");
        let request = ScrapeRequest {
            url,
            formats: ["markdown", "html", "links"],
            only_main_content: false,
        };

        let response: ScrapeResponse = send_json(
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;

        if !response.success {
            return Err(AdapterFailure::Decode(
                response
                    .error
                    .unwrap_or_else(|| "scrape reported failure".to_string()),
            ));
        }

        let data = response
            .data
            .ok_or_else(|| AdapterFailure::Decode("scrape response without data".to_string()))?;
        Ok(into_crawl_result(url, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> FirecrawlClient {
        let config = CrawlConfig {
            endpoint: server.uri(),
            ..CrawlConfig::default()
        };
        FirecrawlClient::new(&config, "fc-key".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_scrape_builds_crawl_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .and(header("authorization", "Bearer fc-key"))
            .and(body_partial_json(json!({"url": "https://shop.example/", "formats": ["markdown", "html", "links"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "markdown": "# Welcome\n\nWe fix pipes fast and cheap.",
                    "html": "<html><body><img src=\"/a.png\"><img src=\"https://cdn.example/b.png\"></body></html>",
                    "links": [
                        "https://shop.example/about",
                        "https://www.shop.example/contact",
                        "https://partner.example/",
                        "https://news.example/story"
                    ],
                    "metadata": {"title": "Shop", "description": "A shop"}
                }
            })))
            .mount(&server)
            .await;

        let result = client(&server).scrape("https://shop.example/").await.unwrap();
        assert_eq!(result.word_count, 7);
        assert_eq!(result.images.len(), 2);
        assert_eq!(result.images[0], "https://shop.example/a.png");
        assert_eq!(result.links.internal.len(), 2);
        assert_eq!(result.links.external.len(), 2);
        assert_eq!(result.title.as_deref(), Some("Shop"));
    }

    #[tokio::test]
    async fn test_unsuccessful_scrape_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "error": "blocked"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).scrape("https://shop.example/").await.unwrap_err();
        assert_eq!(err, AdapterFailure::Decode("blocked".to_string()));
    }

    #[tokio::test]
    async fn test_forbidden_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server).scrape("https://shop.example/").await.unwrap_err();
        assert_eq!(err, AdapterFailure::Unauthorized(403));
    }

    #[test]
    fn test_html_only_response_falls_back_to_parsed_page() {
        let data = ScrapeData {
            html: Some(
                r#"<html><head><title>Only HTML</title></head>
                <body><p>three little words</p><a href="https://elsewhere.example/">x</a></body></html>"#
                    .to_string(),
            ),
            ..ScrapeData::default()
        };
        let result = into_crawl_result("https://site.example/", data);
        assert_eq!(result.word_count, 4);
        assert_eq!(result.links.external.len(), 1);
        assert_eq!(result.title.as_deref(), Some("Only HTML"));
    }
}
