//! Google PageSpeed Insights (Lighthouse) adapter

use super::{build_client, send_json, AdapterResult, LighthouseAnalyzer};
use crate::config::LighthouseConfig;
use crate::error::Result;
use crate::models::{
    LighthouseAudit, LighthouseMetrics, LighthouseOpportunity, LighthouseScores, Strategy,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Lighthouse audits scoring below this are reported as opportunities
const OPPORTUNITY_THRESHOLD: f64 = 0.9;

/// Categories requested from PageSpeed; `pwa` is only reported by older Lighthouse versions
const CATEGORIES: &[&str] = &["performance", "accessibility", "best-practices", "seo", "pwa"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpeedResponse {
    lighthouse_result: LighthouseResult,
}

#[derive(Debug, Deserialize)]
struct LighthouseResult {
    #[serde(default)]
    categories: HashMap<String, Category>,
    #[serde(default)]
    audits: HashMap<String, RawAudit>,
}

#[derive(Debug, Deserialize)]
struct Category {
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAudit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    score: Option<f64>,
    numeric_value: Option<f64>,
    details: Option<AuditDetails>,
}

#[derive(Debug, Deserialize)]
struct AuditDetails {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Scale a 0-1 Lighthouse score to 0-100
fn scale(score: Option<f64>) -> Option<u32> {
    score
        .filter(|s| s.is_finite())
        .map(|s| (s * 100.0).round().clamp(0.0, 100.0) as u32)
}

impl LighthouseResult {
    fn scores(&self) -> LighthouseScores {
        let category = |name: &str| scale(self.categories.get(name).and_then(|c| c.score));
        LighthouseScores {
            performance: category("performance"),
            accessibility: category("accessibility"),
            best_practices: category("best-practices"),
            seo: category("seo"),
            pwa: category("pwa"),
        }
    }

    fn metric(&self, id: &str) -> Option<f64> {
        self.audits.get(id).and_then(|a| a.numeric_value)
    }

    fn metrics(&self) -> LighthouseMetrics {
        LighthouseMetrics {
            first_contentful_paint: self.metric("first-contentful-paint"),
            largest_contentful_paint: self.metric("largest-contentful-paint"),
            total_blocking_time: self.metric("total-blocking-time"),
            cumulative_layout_shift: self.metric("cumulative-layout-shift"),
            speed_index: self.metric("speed-index"),
        }
    }

    fn opportunities(&self) -> Vec<LighthouseOpportunity> {
        let mut opportunities: Vec<LighthouseOpportunity> = self
            .audits
            .iter()
            .filter(|(_, audit)| {
                audit
                    .details
                    .as_ref()
                    .and_then(|d| d.kind.as_deref())
                    .map(|kind| kind == "opportunity")
                    .unwrap_or(false)
            })
            .filter_map(|(id, audit)| {
                let score = audit.score?;
                (score < OPPORTUNITY_THRESHOLD).then(|| LighthouseOpportunity {
                    id: id.clone(),
                    title: audit.title.clone(),
                    description: audit.description.clone(),
                    score,
                })
            })
            .collect();

        // Worst first; map iteration order is arbitrary
        opportunities.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        opportunities
    }
}

/// PageSpeed Insights v5 client
pub struct PageSpeedClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl PageSpeedClient {
    pub fn new(config: &LighthouseConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    async fn run(&self, url: &str, strategy: Strategy) -> AdapterResult<LighthouseResult> {
        let strategy = strategy.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("url", url),
            ("key", self.api_key.as_str()),
            ("strategy", strategy.as_str()),
        ];
        query.extend(CATEGORIES.iter().map(|c| ("category", *c)));

        debug!(url, strategy = %strategy, "Running PageSpeed audit");
        let response: PageSpeedResponse =
            send_json(self.client.get(&self.endpoint).query(&query)).await?;
        Ok(response.lighthouse_result)
    }
}

#[async_trait]
impl LighthouseAnalyzer for PageSpeedClient {
    async fn scores(&self, url: &str, strategy: Strategy) -> AdapterResult<LighthouseScores> {
        Ok(self.run(url, strategy).await?.scores())
    }

    async fn detailed(&self, url: &str, strategy: Strategy) -> AdapterResult<LighthouseAudit> {
        let result = self.run(url, strategy).await?;
        Ok(LighthouseAudit {
            scores: result.scores(),
            metrics: result.metrics(),
            opportunities: result.opportunities(),
        })
    }
}
