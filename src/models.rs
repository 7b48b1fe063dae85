//! Audit data model shared by the auditors, the store and the API surfaces.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Issue severity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Error,
    Warning,
    Info,
}

/// How much an issue is expected to hurt rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::High => write!(f, "high"),
            Impact::Medium => write!(f, "medium"),
            Impact::Low => write!(f, "low"),
        }
    }
}

/// A single finding produced by any checker. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub category: String,
    pub message: String,
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl AuditIssue {
    pub fn new(
        issue_type: IssueType,
        category: impl Into<String>,
        message: impl Into<String>,
        impact: Impact,
    ) -> Self {
        Self {
            issue_type,
            category: category.into(),
            message: message.into(),
            impact,
            url: None,
            recommendation: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// Device profile for PageSpeed runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Mobile,
    Desktop,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Mobile => write!(f, "mobile"),
            Strategy::Desktop => write!(f, "desktop"),
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mobile" => Ok(Strategy::Mobile),
            "desktop" => Ok(Strategy::Desktop),
            _ => Err(Error::Config(format!("Unknown strategy: {}", s))),
        }
    }
}

/// Output of the basic (self-hosted) page audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicAuditResult {
    pub title: String,
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    pub mobile_friendly: bool,
    pub word_count: usize,
    pub image_count: usize,
    pub https: bool,
    pub has_canonical: bool,
    pub structured_data_count: usize,
    pub meta_tags: BTreeMap<String, String>,
    pub issues: Vec<AuditIssue>,
    pub seo_score: u32,
    pub performance_score: u32,
    pub accessibility_score: u32,
    /// Remediation hints, only set when the page could not be fetched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl BasicAuditResult {
    /// True when this result is the connectivity placeholder
    pub fn is_unreachable(&self) -> bool {
        self.issues.iter().any(|i| i.category == "connectivity")
    }
}

/// Lighthouse category scores, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LighthouseScores {
    pub performance: Option<u32>,
    pub accessibility: Option<u32>,
    pub best_practices: Option<u32>,
    pub seo: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwa: Option<u32>,
}

impl LighthouseScores {
    /// The four core category scores in a fixed order
    pub fn core(&self) -> [Option<u32>; 4] {
        [
            self.performance,
            self.accessibility,
            self.seo,
            self.best_practices,
        ]
    }
}

/// Core Web Vitals and lab metrics in milliseconds (CLS is unitless)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LighthouseMetrics {
    pub first_contentful_paint: Option<f64>,
    pub largest_contentful_paint: Option<f64>,
    pub total_blocking_time: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
    pub speed_index: Option<f64>,
}

/// A failing Lighthouse audit that carries a fix suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LighthouseOpportunity {
    pub id: String,
    pub title: String,
    pub description: String,
    /// 0.0-1.0 as reported by Lighthouse
    pub score: f64,
}

/// Detailed PageSpeed result used by the composite pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LighthouseAudit {
    pub scores: LighthouseScores,
    pub metrics: LighthouseMetrics,
    pub opportunities: Vec<LighthouseOpportunity>,
}

/// Links found on a crawled page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkGraph {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

/// Output of the external crawl adapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub word_count: usize,
    pub images: Vec<String>,
    pub links: LinkGraph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Heuristic E-E-A-T proxy scores, each 0-100. Derived, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EeatScores {
    pub experience: u32,
    pub expertise: u32,
    pub authoritativeness: u32,
    pub trustworthiness: u32,
}

impl EeatScores {
    pub fn as_array(&self) -> [u32; 4] {
        [
            self.experience,
            self.expertise,
            self.authoritativeness,
            self.trustworthiness,
        ]
    }
}

/// A grouped, prioritised piece of advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Impact,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Registered client site that owns audit rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub website: String,
    pub industry: Option<String>,
    pub created_at: String,
}

impl Company {
    /// New company with a fresh id; the website must be an http(s) URL
    pub fn new(name: &str, website: &str, industry: Option<String>) -> Result<Self, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Config("company name must not be empty".to_string()));
        }
        let parsed = url::Url::parse(website.trim())?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(Error::Config(format!(
                "company website must be an http(s) URL: {}",
                website
            )));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            website: parsed.to_string(),
            industry: industry.filter(|i| !i.trim().is_empty()),
            created_at: timestamp(),
        })
    }
}

/// RFC 3339 UTC timestamp with microseconds, so rows sort by creation order
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Audit row shape before the store assigns identity and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSeoAudit {
    pub url: String,
    pub score: u32,
    pub title: String,
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    pub meta_tags: BTreeMap<String, String>,
    pub performance_score: u32,
    pub accessibility_score: u32,
    pub seo_score: u32,
    pub issues: Vec<AuditIssue>,
    /// Open JSON object; fields are additive
    pub extended_data: Value,
}

/// A persisted audit row. Appended once per run, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoAudit {
    pub id: String,
    pub company_id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub audit: NewSeoAudit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_serializes_type_field() {
        let issue = AuditIssue::new(IssueType::Warning, "meta", "Title too short", Impact::Medium);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["impact"], "medium");
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_company_requires_http_website() {
        let company = Company::new(" Acme ", "https://acme.example", None).unwrap();
        assert_eq!(company.name, "Acme");
        assert_eq!(company.website, "https://acme.example/");
        assert!(Company::new("Acme", "ftp://acme.example", None).is_err());
        assert!(Company::new("Acme", "acme.example", None).is_err());
        assert!(Company::new("  ", "https://acme.example", None).is_err());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Desktop".parse::<Strategy>().unwrap(), Strategy::Desktop);
        assert!("tablet".parse::<Strategy>().is_err());
    }
}
