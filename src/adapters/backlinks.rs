//! Backlink analysis from free sources
//!
//! Domain rating comes from OpenPageRank when a key is configured. Indexed
//! captures come from the Common Crawl CDX index, which needs no key; the
//! distinct hosts among those captures stand in for referring domains. When
//! OpenPageRank is unavailable the rating is estimated from capture counts.

use super::{build_client, log_failure, send_json, send_text, AdapterResult, BacklinkAnalyzer};
use crate::config::BacklinkConfig;
use crate::error::{AdapterFailure, Result};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use url::Url;

/// OpenPageRank accepts at most this many domains per request
const OPR_BATCH_SIZE: usize = 100;

/// Where a domain rating came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingSource {
    OpenPageRank,
    Estimated,
}

/// Backlink summary for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklinkProfile {
    pub domain: String,
    pub total_backlinks: usize,
    pub referring_domains: usize,
    /// 0-100
    pub domain_rating: u32,
    pub rating_source: RatingSource,
}

#[derive(Debug, Deserialize)]
struct OprResponse {
    #[serde(default)]
    response: Vec<OprEntry>,
}

#[derive(Debug, Deserialize)]
struct OprEntry {
    domain: String,
    #[serde(default)]
    page_rank_decimal: Value,
}

/// Heuristic rating used without OpenPageRank. Every capture is treated as a
/// followed link, so any captures earn the full link-quality component.
pub fn estimate_domain_rating(total_backlinks: usize, referring_domains: usize) -> u32 {
    let backlink_score = ((total_backlinks + 1) as f64).log10() * 10.0;
    let domain_score = ((referring_domains + 1) as f64).log10() * 20.0;
    let quality_score = if total_backlinks > 0 { 10.0 } else { 0.0 };
    (backlink_score + domain_score + quality_score).round().min(100.0) as u32
}

/// OpenPageRank domain authority client
#[derive(Clone)]
pub struct OpenPageRank {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenPageRank {
    pub fn new(config: &BacklinkConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.openpagerank_endpoint.clone(),
            api_key,
        })
    }

    async fn fetch_batch(&self, domains: &[String]) -> AdapterResult<Vec<OprEntry>> {
        let query: Vec<(&str, &str)> = domains.iter().map(|d| ("domains[]", d.as_str())).collect();
        let response: OprResponse = send_json(
            self.client
                .get(&self.endpoint)
                .header("API-OPR", &self.api_key)
                .query(&query),
        )
        .await?;
        Ok(response.response)
    }

    /// Domain ratings (0-100) keyed by domain. Domains OpenPageRank does not
    /// know are absent from the map.
    pub async fn domain_ratings(&self, domains: &[String]) -> AdapterResult<HashMap<String, u32>> {
        let batches = join_all(domains.chunks(OPR_BATCH_SIZE).map(|b| self.fetch_batch(b))).await;

        let mut ratings = HashMap::new();
        for batch in batches {
            for entry in batch? {
                let decimal = match &entry.page_rank_decimal {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                if let Some(decimal) = decimal.filter(|d| d.is_finite()) {
                    let rating = (decimal * 10.0).round().clamp(0.0, 100.0) as u32;
                    ratings.insert(entry.domain.to_lowercase(), rating);
                }
            }
        }
        Ok(ratings)
    }

    pub async fn domain_rating(&self, domain: &str) -> AdapterResult<u32> {
        let ratings = self.domain_ratings(&[domain.to_string()]).await?;
        Ok(ratings.get(&domain.to_lowercase()).copied().unwrap_or(0))
    }
}

#[derive(Debug, Deserialize)]
struct CdxRecord {
    url: String,
}

/// Capture counts from the Common Crawl index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CaptureCounts {
    records: usize,
    hosts: usize,
}

/// Backlink analyzer combining Common Crawl with optional OpenPageRank
pub struct WebGraphBacklinks {
    client: Client,
    cdx_url: String,
    limit: usize,
    page_rank: Option<OpenPageRank>,
}

impl WebGraphBacklinks {
    pub fn new(config: &BacklinkConfig, page_rank: Option<OpenPageRank>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            cdx_url: format!(
                "{}/{}",
                config.commoncrawl_endpoint.trim_end_matches('/'),
                config.commoncrawl_collection
            ),
            limit: config.commoncrawl_limit,
            page_rank,
        })
    }

    async fn captures(&self, domain: &str) -> AdapterResult<CaptureCounts> {
        let pattern = format!("{}/*", domain);
        let limit = self.limit.to_string();
        let request = self.client.get(&self.cdx_url).query(&[
            ("url", pattern.as_str()),
            ("output", "json"),
            ("limit", limit.as_str()),
        ]);

        let body = match send_text(request).await {
            Ok(body) => body,
            // The index answers 404 when it holds no captures
            Err(AdapterFailure::Upstream(404)) => return Ok(CaptureCounts::default()),
            Err(e) => return Err(e),
        };

        let mut records = 0;
        let mut hosts = HashSet::new();
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let record: CdxRecord = serde_json::from_str(line)?;
            records += 1;
            if let Some(host) = Url::parse(&record.url)
                .ok()
                .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
            {
                hosts.insert(host);
            }
        }

        Ok(CaptureCounts {
            records,
            hosts: hosts.len(),
        })
    }
}

#[async_trait]
impl BacklinkAnalyzer for WebGraphBacklinks {
    async fn analyze(&self, domain: &str) -> AdapterResult<BacklinkProfile> {
        debug!(domain, "Analyzing backlinks");

        let rating_call = async {
            match &self.page_rank {
                Some(opr) => Some(opr.domain_rating(domain).await),
                None => None,
            }
        };
        let (captures, rating) = tokio::join!(self.captures(domain), rating_call);

        let rating = match rating {
            Some(Ok(rating)) => Some(rating),
            Some(Err(cause)) => {
                log_failure("openpagerank", &cause);
                None
            }
            None => None,
        };

        let counts = match (captures, rating) {
            (Ok(counts), _) => counts,
            // Captures are optional once a rating exists
            (Err(cause), Some(_)) => {
                log_failure("commoncrawl", &cause);
                CaptureCounts::default()
            }
            (Err(cause), None) => return Err(cause),
        };

        let (domain_rating, rating_source) = match rating {
            Some(rating) => (rating, RatingSource::OpenPageRank),
            None => (
                estimate_domain_rating(counts.records, counts.hosts),
                RatingSource::Estimated,
            ),
        };

        info!(
            domain,
            domain_rating,
            referring_domains = counts.hosts,
            "Backlink analysis completed"
        );

        Ok(BacklinkProfile {
            domain: domain.to_string(),
            total_backlinks: counts.records,
            referring_domains: counts.hosts,
            domain_rating,
            rating_source,
        })
    }
}
