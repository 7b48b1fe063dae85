//! SerpAPI search result analysis

use super::{build_client, log_failure, send_json, AdapterResult, OpenPageRank, SerpAnalyzer};
use crate::config::SerpConfig;
use crate::error::Result;
use crate::parse::bare_host;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

/// One organic result with the signals used for competitor comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpResult {
    pub position: u32,
    pub url: String,
    pub domain: String,
    pub title: String,
    pub description: String,
    /// 0-100, 0 when no rating source is configured
    pub domain_rating: u32,
    pub has_schema: bool,
    pub content_type: String,
}

/// SERP analysis for one keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpAnalysis {
    pub keyword: String,
    /// SERP features present (featured snippet, people also ask, ...)
    pub features: Vec<String>,
    pub top_results: Vec<SerpResult>,
    pub avg_domain_rating: u32,
    /// 1-based position of the audited domain, if it ranks
    pub current_position: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    answer_box: Option<Value>,
    related_questions: Option<Value>,
    knowledge_graph: Option<Value>,
    local_results: Option<Value>,
    inline_images: Option<Value>,
    inline_videos: Option<Value>,
    shopping_results: Option<Value>,
    top_stories: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    position: Option<u32>,
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    rich_snippet: Option<Value>,
    rich_snippet_list: Option<Value>,
}

impl SearchResponse {
    fn features(&self) -> Vec<String> {
        [
            ("featured_snippet", &self.answer_box),
            ("people_also_ask", &self.related_questions),
            ("knowledge_panel", &self.knowledge_graph),
            ("local_pack", &self.local_results),
            ("image_pack", &self.inline_images),
            ("video_pack", &self.inline_videos),
            ("shopping", &self.shopping_results),
            ("news", &self.top_stories),
        ]
        .iter()
        .filter(|(_, v)| v.is_some())
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

fn content_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"\b(guide|how to|tutorial|step by step)\b", "Guide"),
            (r"\b(list|top \d+|best)\b", "Listicle"),
            (r"\b(review|vs|comparison)\b", "Review"),
            (r"\b(what is|definition|meaning)\b", "Definition"),
            (r"\b(buy|price|cost|shop)\b", "Commercial"),
            (r"\b(news|update|announced)\b", "News"),
        ]
        .into_iter()
        .filter_map(|(pattern, label)| Regex::new(pattern).ok().map(|re| (re, label)))
        .collect()
    })
}

/// Guess the content format of a result from its title and snippet
pub fn detect_content_type(title: &str, snippet: &str) -> &'static str {
    let text = format!("{} {}", title, snippet).to_lowercase();
    content_patterns()
        .iter()
        .find(|(re, _)| re.is_match(&text))
        .map(|(_, label)| *label)
        .unwrap_or("Informational")
}

/// SerpAPI Google search client
pub struct SerpApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    country: String,
    language: String,
    num_results: usize,
    page_rank: Option<OpenPageRank>,
}

impl SerpApiClient {
    pub fn new(config: &SerpConfig, api_key: String, page_rank: Option<OpenPageRank>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.endpoint.clone(),
            api_key,
            country: config.country.clone(),
            language: config.language.clone(),
            num_results: config.num_results,
            page_rank,
        })
    }
}

#[async_trait]
impl SerpAnalyzer for SerpApiClient {
    async fn analyze(&self, keyword: &str, current_domain: &str) -> AdapterResult<SerpAnalysis> {
        debug!(keyword, "Fetching SERP");
        let num = self.num_results.to_string();
        let response: SearchResponse = send_json(self.client.get(&self.endpoint).query(&[
            ("api_key", self.api_key.as_str()),
            ("q", keyword),
            ("engine", "google"),
            ("num", num.as_str()),
            ("gl", self.country.as_str()),
            ("hl", self.language.as_str()),
        ]))
        .await?;

        let features = response.features();
        let mut top_results: Vec<SerpResult> = response
            .organic_results
            .into_iter()
            .take(self.num_results)
            .enumerate()
            .filter_map(|(idx, r)| {
                let domain = bare_host(&r.link)?;
                Some(SerpResult {
                    position: r.position.unwrap_or(idx as u32 + 1),
                    content_type: detect_content_type(&r.title, &r.snippet).to_string(),
                    has_schema: r.rich_snippet.is_some() || r.rich_snippet_list.is_some(),
                    url: r.link,
                    domain,
                    title: r.title,
                    description: r.snippet,
                    domain_rating: 0,
                })
            })
            .collect();

        if let Some(opr) = &self.page_rank {
            let domains: Vec<String> = top_results.iter().map(|r| r.domain.clone()).collect();
            match opr.domain_ratings(&domains).await {
                Ok(ratings) => {
                    for result in &mut top_results {
                        result.domain_rating = ratings.get(&result.domain).copied().unwrap_or(0);
                    }
                }
                Err(cause) => log_failure("openpagerank", &cause),
            }
        }

        let avg_domain_rating = if top_results.is_empty() {
            0
        } else {
            let total: u32 = top_results.iter().map(|r| r.domain_rating).sum();
            (total as f64 / top_results.len() as f64).round() as u32
        };

        let current = bare_host(&format!("https://{}", current_domain))
            .unwrap_or_else(|| current_domain.to_lowercase());
        let current_position = top_results
            .iter()
            .position(|r| r.domain == current)
            .map(|idx| idx as u32 + 1);

        Ok(SerpAnalysis {
            keyword: keyword.to_string(),
            features,
            top_results,
            avg_domain_rating,
            current_position,
        })
    }
}
