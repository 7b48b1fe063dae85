//! External analyzer adapters
//!
//! Each adapter is optional. It is built once from config when its API key
//! resolves, otherwise the slot stays `None` and a warning is logged. Every
//! call returns `Result<_, AdapterFailure>`; orchestrators pass the future
//! through [`settle`], which logs the classified cause and yields `None`, so
//! "not configured" and "failed" take the same path downstream.

pub mod ai;
pub mod backlinks;
pub mod firecrawl;
pub mod lighthouse;
pub mod serp;

pub use ai::{AnthropicClient, KeywordIdea};
pub use backlinks::{BacklinkProfile, OpenPageRank, WebGraphBacklinks};
pub use firecrawl::FirecrawlClient;
pub use lighthouse::PageSpeedClient;
pub use serp::{SerpAnalysis, SerpApiClient, SerpResult};

use crate::config::Config;
use crate::error::{AdapterFailure, Error, Result};
use crate::models::{CrawlResult, LighthouseAudit, LighthouseScores, Strategy};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a single adapter call
pub type AdapterResult<T> = std::result::Result<T, AdapterFailure>;

/// PageSpeed / Lighthouse scoring
#[async_trait]
pub trait LighthouseAnalyzer: Send + Sync {
    /// Category scores only
    async fn scores(&self, url: &str, strategy: Strategy) -> AdapterResult<LighthouseScores>;

    /// Scores plus core metrics and failing opportunity audits
    async fn detailed(&self, url: &str, strategy: Strategy) -> AdapterResult<LighthouseAudit>;
}

/// Third-party page extraction
#[async_trait]
pub trait ContentCrawler: Send + Sync {
    async fn scrape(&self, url: &str) -> AdapterResult<CrawlResult>;
}

/// Domain authority and referring domains
#[async_trait]
pub trait BacklinkAnalyzer: Send + Sync {
    async fn analyze(&self, domain: &str) -> AdapterResult<BacklinkProfile>;
}

/// Search result competition for a keyword
#[async_trait]
pub trait SerpAnalyzer: Send + Sync {
    async fn analyze(&self, keyword: &str, current_domain: &str) -> AdapterResult<SerpAnalysis>;
}

/// Free-form text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32)
        -> AdapterResult<String>;
}

/// The set of configured adapters, resolved once at startup
#[derive(Clone, Default)]
pub struct Adapters {
    pub lighthouse: Option<Arc<dyn LighthouseAnalyzer>>,
    pub crawl: Option<Arc<dyn ContentCrawler>>,
    pub backlinks: Option<Arc<dyn BacklinkAnalyzer>>,
    pub serp: Option<Arc<dyn SerpAnalyzer>>,
    pub ai: Option<Arc<dyn TextGenerator>>,
}

impl Adapters {
    /// Build every adapter whose API key is present
    pub fn from_config(config: &Config) -> Result<Self> {
        let lighthouse: Option<Arc<dyn LighthouseAnalyzer>> = match config.lighthouse_api_key() {
            Some(key) => {
                info!("Lighthouse adapter enabled");
                Some(Arc::new(PageSpeedClient::new(&config.lighthouse, key)?))
            }
            None => {
                warn!(
                    envs = ?config.lighthouse.api_key_envs,
                    "PageSpeed API key not configured - Lighthouse audits will be skipped"
                );
                None
            }
        };

        let crawl: Option<Arc<dyn ContentCrawler>> = match config.crawl_api_key() {
            Some(key) => {
                info!("Crawl adapter enabled");
                Some(Arc::new(FirecrawlClient::new(&config.crawl, key)?))
            }
            None => {
                warn!(
                    env = %config.crawl.api_key_env,
                    "Crawl API key not configured - crawls will be skipped"
                );
                None
            }
        };

        // OpenPageRank is shared between backlink and SERP analysis when present
        let page_rank = match config.backlinks_api_key() {
            Some(key) => Some(OpenPageRank::new(&config.backlinks, key)?),
            None => {
                warn!(
                    env = %config.backlinks.api_key_env,
                    "OpenPageRank API key not configured - domain ratings will be estimated"
                );
                None
            }
        };

        let backlinks: Option<Arc<dyn BacklinkAnalyzer>> = Some(Arc::new(
            WebGraphBacklinks::new(&config.backlinks, page_rank.clone())?,
        ));

        let serp: Option<Arc<dyn SerpAnalyzer>> = match config.serp_api_key() {
            Some(key) => {
                info!("SERP adapter enabled");
                Some(Arc::new(SerpApiClient::new(&config.serp, key, page_rank)?))
            }
            None => {
                warn!(
                    env = %config.serp.api_key_env,
                    "SERP API key not configured - competitor analysis will be skipped"
                );
                None
            }
        };

        let ai: Option<Arc<dyn TextGenerator>> = match config.ai_api_key() {
            Some(key) => {
                info!(model = %config.ai.model, "AI adapter enabled");
                Some(Arc::new(AnthropicClient::new(&config.ai, key)?))
            }
            None => {
                warn!(
                    env = %config.ai.api_key_env,
                    "AI API key not configured - keyword and summary fallbacks will be used"
                );
                None
            }
        };

        Ok(Self {
            lighthouse,
            crawl,
            backlinks,
            serp,
            ai,
        })
    }

    /// Names of the adapters that are configured
    pub fn enabled(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.lighthouse.is_some() {
            names.push("lighthouse");
        }
        if self.crawl.is_some() {
            names.push("crawl");
        }
        if self.backlinks.is_some() {
            names.push("backlinks");
        }
        if self.serp.is_some() {
            names.push("serp");
        }
        if self.ai.is_some() {
            names.push("ai");
        }
        names
    }
}

/// Await an adapter call, logging any failure and discarding it
pub async fn settle<T, F>(adapter: &'static str, call: F) -> Option<T>
where
    F: Future<Output = AdapterResult<T>>,
{
    match call.await {
        Ok(value) => {
            debug!(adapter, "Adapter call completed");
            Some(value)
        }
        Err(cause) => {
            log_failure(adapter, &cause);
            None
        }
    }
}

/// Log an adapter failure with its classified cause
pub fn log_failure(adapter: &'static str, cause: &AdapterFailure) {
    match cause {
        AdapterFailure::RateLimited => {
            error!(adapter, "API rate limit exceeded - continuing without it")
        }
        AdapterFailure::Unauthorized(status) => {
            error!(adapter, status, "API authentication failed - check the API key")
        }
        AdapterFailure::Network(msg) => {
            error!(adapter, error = %msg, "Network error reaching API - continuing without it")
        }
        AdapterFailure::NotConfigured => warn!(adapter, "Adapter not configured - skipping"),
        other => error!(adapter, error = %other, "Adapter call failed"),
    }
}

/// Shared reqwest client for adapters
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .gzip(true)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and decode a JSON body, classifying failures
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> AdapterResult<T> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdapterFailure::from_status(status.as_u16()));
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Send a request and return the raw text body, classifying failures
pub(crate) async fn send_text(request: RequestBuilder) -> AdapterResult<String> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdapterFailure::from_status(status.as_u16()));
    }
    Ok(response.text().await?)
}
