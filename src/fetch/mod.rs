//! Page fetching for the basic auditor
//!
//! This module provides:
//! - A shared HTTP client with browser-like headers, timeout and redirect cap
//! - Classification of non-success statuses and transport errors into
//!   `FetchFailure`, so callers can explain why a site could not be audited

use crate::config::FetchConfig;
use crate::error::{Error, FetchFailure, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// A fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// HTTP fetcher for audited pages
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a new fetcher
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch a page, classifying any failure
    pub async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchFailure> {
        let parsed = Url::parse(url)
            .map_err(|e| FetchFailure::Other(format!("invalid URL '{}': {}", url, e)))?;

        debug!("Fetching: {}", url);

        let response = self.client.get(parsed).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Page request failed");
            FetchFailure::from_transport(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Page returned non-success status");
            return Err(FetchFailure::from_status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::from_transport(&e))?;

        debug!("Fetched {} ({} bytes)", final_url, body.len());

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
