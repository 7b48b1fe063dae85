//! Comprehensive audit
//!
//! Two concurrent stages. The first gathers Lighthouse detail, the basic
//! audit, the backlink profile and a primary keyword; the second expands
//! the keyword and reads the SERP for it, which needs the keyword first.
//! Every adapter result is optional. Category scores are blended with fixed
//! weights renormalised over the categories actually present.

use super::aggregate::mean_of_present;
use super::basic::{BasicAuditor, DESCRIPTION_MIN_CHARS, TITLE_MIN_CHARS};
use super::eeat;
use crate::adapters::ai::{clean_phrase, parse_keyword_ideas};
use crate::adapters::{log_failure, settle, Adapters, BacklinkProfile, KeywordIdea, SerpAnalysis};
use crate::models::{
    timestamp, AuditIssue, BasicAuditResult, Company, EeatScores, Impact, IssueType,
    LighthouseAudit, NewSeoAudit, Strategy,
};
use crate::parse::bare_host;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Blend weights in percent: lighthouse, technical SEO, content, backlinks, E-E-A-T
const WEIGHTS: [u32; 5] = [25, 20, 15, 20, 20];

/// Number of keyword ideas requested from the text generator
pub const KEYWORD_EXPANSION_COUNT: usize = 20;

const MAX_KEYWORD_OPPORTUNITIES: usize = 10;
const MAX_COMPETITORS: usize = 5;
const RESPONSE_LIST_LIMIT: usize = 10;

/// Per-category scores, each absent when its input is absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub lighthouse: Option<u32>,
    pub technical_seo: Option<u32>,
    pub content: Option<u32>,
    pub backlinks: Option<u32>,
    pub eeat: Option<u32>,
}

impl CategoryScores {
    fn weighted(&self) -> [(Option<u32>, u32); 5] {
        [
            (self.lighthouse, WEIGHTS[0]),
            (self.technical_seo, WEIGHTS[1]),
            (self.content, WEIGHTS[2]),
            (self.backlinks, WEIGHTS[3]),
            (self.eeat, WEIGHTS[4]),
        ]
    }

    /// Weighted mean over present categories, 0 when none are present
    pub fn blend(&self) -> u32 {
        let (total, weight) = self
            .weighted()
            .iter()
            .filter_map(|(score, weight)| score.map(|s| (s as f64 * *weight as f64, *weight)))
            .fold((0.0, 0u32), |(total, weights), (value, weight)| {
                (total + value, weights + weight)
            });
        if weight == 0 {
            return 0;
        }
        (total / weight as f64).round() as u32
    }
}

/// An actionable opening found during the audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Opportunity {
    Keyword {
        keyword: String,
        search_volume: u64,
        difficulty: u32,
        relevance: u32,
        opportunity_score: u32,
        recommendation: String,
    },
    Backlink {
        domain: String,
        domain_rating: u32,
        recommendation: String,
    },
    Technical {
        category: String,
        current_score: u32,
        target_score: u32,
        estimated_impact: Impact,
        recommendation: String,
    },
}

/// A domain ranking for the primary keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub domain: String,
    pub domain_rating: u32,
    pub position: u32,
    pub url: String,
}

/// Everything the comprehensive audit computed, before persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    pub company_id: String,
    pub url: String,
    pub primary_keyword: String,
    pub basic: BasicAuditResult,
    pub lighthouse: Option<LighthouseAudit>,
    pub backlinks: Option<BacklinkProfile>,
    pub keyword_ideas: Vec<KeywordIdea>,
    pub serp: Option<SerpAnalysis>,
    pub scores: CategoryScores,
    pub overall_score: u32,
    pub eeat_score: u32,
    pub eeat_breakdown: EeatScores,
    pub issues: Vec<AuditIssue>,
    pub opportunities: Vec<Opportunity>,
    pub competitors: Vec<Competitor>,
    pub executive_summary: String,
}

/// API response for a completed comprehensive audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveResponse {
    pub success: bool,
    pub audit_id: String,
    pub company_id: String,
    pub url: String,
    pub overall_score: u32,
    pub scores: CategoryScores,
    pub eeat_score: u32,
    pub issues_count: usize,
    pub opportunities_count: usize,
    pub competitors_count: usize,
    pub executive_summary: String,
    pub issues: Vec<AuditIssue>,
    pub opportunities: Vec<Opportunity>,
    pub competitors: Vec<Competitor>,
    pub duration_seconds: u64,
}

/// Content quality score from on-page signals
pub fn content_score(basic: &BasicAuditResult) -> u32 {
    if basic.is_unreachable() {
        return 0;
    }
    let mut deductions = 0u32;
    if basic.title.chars().count() < TITLE_MIN_CHARS {
        deductions += 15;
    }
    if basic.meta_description.chars().count() < DESCRIPTION_MIN_CHARS {
        deductions += 15;
    }
    match basic.h1_tags.len() {
        0 => deductions += 15,
        1 => {}
        _ => deductions += 10,
    }
    let accessibility_issues = basic
        .issues
        .iter()
        .filter(|i| i.category == "accessibility")
        .count() as u32;
    deductions += (accessibility_issues * 5).min(25);
    100u32.saturating_sub(deductions)
}

/// Mean of the four core Lighthouse categories
pub fn lighthouse_category(audit: &LighthouseAudit) -> Option<u32> {
    mean_of_present(audit.scores.core().map(|v| v.map(f64::from)))
}

/// Issues contributed by each source, in a fixed order
pub fn collect_issues(
    url: &str,
    basic: &BasicAuditResult,
    lighthouse: Option<&LighthouseAudit>,
    backlinks: Option<&BacklinkProfile>,
    keyword_count: usize,
    serp: Option<&SerpAnalysis>,
) -> Vec<AuditIssue> {
    let mut issues = Vec::new();

    if let Some(audit) = lighthouse {
        for opportunity in &audit.opportunities {
            let impact = if opportunity.score < 0.5 {
                Impact::High
            } else {
                Impact::Medium
            };
            issues.push(
                AuditIssue::new(IssueType::Warning, "performance", &opportunity.title, impact)
                    .with_recommendation(&opportunity.description),
            );
        }
    }

    issues.extend(basic.issues.iter().cloned().map(|issue| issue.with_url(url)));

    if let Some(profile) = backlinks {
        if profile.domain_rating < 30 {
            issues.push(
                AuditIssue::new(
                    IssueType::Warning,
                    "authority",
                    "Low domain authority",
                    Impact::High,
                )
                .with_recommendation(format!(
                    "Build high-quality backlinks. Current DR: {}/100",
                    profile.domain_rating
                )),
            );
        }
        if profile.referring_domains < 50 {
            issues.push(
                AuditIssue::new(
                    IssueType::Warning,
                    "backlinks",
                    "Limited backlink diversity",
                    Impact::Medium,
                )
                .with_recommendation(format!(
                    "Acquire backlinks from more unique domains. Current: {}",
                    profile.referring_domains
                )),
            );
        }
    }

    if keyword_count < 10 {
        issues.push(
            AuditIssue::new(
                IssueType::Info,
                "keywords",
                "Limited keyword opportunities identified",
                Impact::Low,
            )
            .with_recommendation("Expand keyword strategy with long-tail variations"),
        );
    }

    if let (Some(profile), Some(serp)) = (backlinks, serp) {
        if !serp.top_results.is_empty() && profile.domain_rating + 10 < serp.avg_domain_rating {
            issues.push(
                AuditIssue::new(
                    IssueType::Warning,
                    "competition",
                    "Below competitor average domain authority",
                    Impact::High,
                )
                .with_recommendation(format!(
                    "Competitors average DR {}, yours: {}",
                    serp.avg_domain_rating, profile.domain_rating
                )),
            );
        }
    }

    issues
}

fn keyword_opportunity(idea: &KeywordIdea) -> Option<Opportunity> {
    if !(idea.difficulty < 50.0 && idea.search_volume > 100.0) {
        return None;
    }
    let volume = idea.search_volume.round() as u64;
    let difficulty = idea.difficulty.round().max(0.0) as u32;
    let score = (idea.search_volume / 1000.0 * (100.0 - idea.difficulty) / 100.0)
        .round()
        .max(0.0) as u32;
    Some(Opportunity::Keyword {
        keyword: idea.keyword.clone(),
        search_volume: volume,
        difficulty,
        relevance: idea.relevance.round().clamp(0.0, 100.0) as u32,
        opportunity_score: score,
        recommendation: format!(
            "Target \"{}\" - {} monthly searches, {}% difficulty",
            idea.keyword, volume, difficulty
        ),
    })
}

/// Keyword, backlink and technical opportunities
pub fn collect_opportunities(
    keyword_ideas: &[KeywordIdea],
    serp: Option<&SerpAnalysis>,
    scores: &CategoryScores,
) -> Vec<Opportunity> {
    let mut opportunities: Vec<Opportunity> = keyword_ideas
        .iter()
        .filter_map(keyword_opportunity)
        .take(MAX_KEYWORD_OPPORTUNITIES)
        .collect();

    if let Some(serp) = serp {
        opportunities.extend(serp.top_results.iter().take(MAX_COMPETITORS).map(|result| {
            Opportunity::Backlink {
                domain: result.domain.clone(),
                domain_rating: result.domain_rating,
                recommendation: format!(
                    "Analyze backlink profile of {} (DR {}) for link opportunities",
                    result.domain, result.domain_rating
                ),
            }
        }));
    }

    if let Some(current) = scores.lighthouse.filter(|s| *s < 80) {
        opportunities.push(Opportunity::Technical {
            category: "performance".to_string(),
            current_score: current,
            target_score: 90,
            estimated_impact: Impact::High,
            recommendation: "Improve Core Web Vitals to boost user experience and rankings"
                .to_string(),
        });
    }

    opportunities
}

fn competitors(serp: Option<&SerpAnalysis>) -> Vec<Competitor> {
    serp.map(|s| {
        s.top_results
            .iter()
            .take(MAX_COMPETITORS)
            .map(|r| Competitor {
                domain: r.domain.clone(),
                domain_rating: r.domain_rating,
                position: r.position,
                url: r.url.clone(),
            })
            .collect()
    })
    .unwrap_or_default()
}

fn display_score(score: Option<u32>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| s.to_string())
}

/// Deterministic summary used when no text generator is available
pub fn fallback_summary(url: &str, overall: u32, issues: usize, opportunities: usize) -> String {
    format!(
        "Audit completed for {}. Overall SEO score: {}/100. Found {} issues and {} opportunities for improvement.",
        url, overall, issues, opportunities
    )
}

/// Runs the comprehensive audit; built once and shared
#[derive(Clone)]
pub struct CompositeAuditor {
    basic: BasicAuditor,
    adapters: Adapters,
    strategy: Strategy,
}

impl CompositeAuditor {
    pub fn new(basic: BasicAuditor, adapters: Adapters, strategy: Strategy) -> Self {
        Self {
            basic,
            adapters,
            strategy,
        }
    }

    async fn lighthouse(&self, url: &str) -> Option<LighthouseAudit> {
        let analyzer = self.adapters.lighthouse.as_ref()?;
        settle("lighthouse", analyzer.detailed(url, self.strategy)).await
    }

    async fn backlinks(&self, domain: &str) -> Option<BacklinkProfile> {
        let analyzer = self.adapters.backlinks.as_ref()?;
        settle("backlinks", analyzer.analyze(domain)).await
    }

    async fn serp(&self, keyword: &str, domain: &str) -> Option<SerpAnalysis> {
        let analyzer = self.adapters.serp.as_ref()?;
        settle("serp", analyzer.analyze(keyword, domain)).await
    }

    /// Primary keyword from the text generator, falling back to the company name
    async fn primary_keyword(&self, company: &Company) -> String {
        let Some(ai) = self.adapters.ai.as_ref() else {
            return company.name.clone();
        };
        let prompt = format!(
            "Given this business: \"{}\" in the {} industry, what is the most likely primary SEO keyword they should target? Return ONLY the keyword phrase, nothing else.",
            company.name,
            company.industry.as_deref().unwrap_or("")
        );
        settle("ai", ai.generate(&prompt, 50, 0.3))
            .await
            .map(|reply| clean_phrase(&reply))
            .filter(|phrase| !phrase.is_empty())
            .unwrap_or_else(|| company.name.clone())
    }

    /// Related keyword ideas; empty without a text generator
    async fn expand_keywords(&self, seed: &str) -> Vec<KeywordIdea> {
        let Some(ai) = self.adapters.ai.as_ref() else {
            return Vec::new();
        };
        let prompt = format!(
            r#"Generate {count} related keyword variations for: "{seed}"

Include:
- Long-tail keywords
- Semantic variations
- Question keywords
- Related topics
- LSI keywords
- Commercial intent keywords

Return as JSON array with this structure:
[
  {{
    "keyword": "keyword phrase",
    "searchVolume": estimated_number,
    "difficulty": 0-100,
    "relevance": 0-100
  }}
]"#,
            count = KEYWORD_EXPANSION_COUNT,
            seed = seed
        );
        let Some(reply) = settle("ai", ai.generate(&prompt, 2000, 0.8)).await else {
            return Vec::new();
        };
        match parse_keyword_ideas(&reply) {
            Ok(mut ideas) => {
                ideas.truncate(KEYWORD_EXPANSION_COUNT);
                ideas
            }
            Err(cause) => {
                log_failure("ai", &cause);
                Vec::new()
            }
        }
    }

    async fn executive_summary(
        &self,
        url: &str,
        overall: u32,
        scores: &CategoryScores,
        issues: usize,
        opportunities: usize,
    ) -> String {
        let fallback = || fallback_summary(url, overall, issues, opportunities);
        let Some(ai) = self.adapters.ai.as_ref() else {
            return fallback();
        };
        let prompt = format!(
            "As an SEO expert, write a concise 3-paragraph executive summary for this website audit:

Website: {url}
Overall SEO Score: {overall}/100
Lighthouse: {lighthouse}/100
Technical SEO: {technical}/100
Content: {content}/100
Backlinks: {backlinks}/100
Issues Found: {issues}
Opportunities: {opportunities}

Format:
Paragraph 1: Current state overview
Paragraph 2: Key strengths and weaknesses
Paragraph 3: Priority recommendations

Keep it professional, actionable, and under 300 words.",
            lighthouse = display_score(scores.lighthouse),
            technical = display_score(scores.technical_seo),
            content = display_score(scores.content),
            backlinks = display_score(scores.backlinks),
        );
        settle("ai", ai.generate(&prompt, 500, 0.5))
            .await
            .map(|summary| summary.trim().to_string())
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(fallback)
    }

    /// Run both stages for a company's website. Never fails; persistence is the caller's.
    pub async fn run(&self, company: &Company) -> ComprehensiveReport {
        let url = company.website.as_str();
        let domain = bare_host(url).unwrap_or_else(|| url.to_string());
        info!(company_id = %company.id, url, "Starting comprehensive audit");

        let (lighthouse, basic, backlinks, primary_keyword) = tokio::join!(
            self.lighthouse(url),
            self.basic.audit(url),
            self.backlinks(&domain),
            self.primary_keyword(company),
        );
        debug!(keyword = %primary_keyword, "Primary keyword resolved");

        let (keyword_ideas, serp) = tokio::join!(
            self.expand_keywords(&primary_keyword),
            self.serp(&primary_keyword, &domain),
        );

        let eeat_score = eeat::composite_score(
            &basic,
            lighthouse.as_ref().map(|a| &a.scores),
            backlinks.as_ref(),
            url,
        );
        let scores = CategoryScores {
            lighthouse: lighthouse.as_ref().and_then(lighthouse_category),
            technical_seo: Some(basic.seo_score),
            content: Some(content_score(&basic)),
            backlinks: backlinks.as_ref().map(|b| b.domain_rating.min(100)),
            eeat: Some(eeat_score),
        };

        let issues = collect_issues(
            url,
            &basic,
            lighthouse.as_ref(),
            backlinks.as_ref(),
            keyword_ideas.len(),
            serp.as_ref(),
        );
        let opportunities = collect_opportunities(&keyword_ideas, serp.as_ref(), &scores);
        let competitors = competitors(serp.as_ref());
        let overall_score = scores.blend();

        let executive_summary = self
            .executive_summary(url, overall_score, &scores, issues.len(), opportunities.len())
            .await;

        info!(
            company_id = %company.id,
            overall_score,
            issues = issues.len(),
            opportunities = opportunities.len(),
            "Comprehensive audit analysed"
        );

        ComprehensiveReport {
            company_id: company.id.clone(),
            url: url.to_string(),
            primary_keyword,
            eeat_breakdown: eeat::calculate(&basic, None),
            basic,
            lighthouse,
            backlinks,
            keyword_ideas,
            serp,
            scores,
            overall_score,
            eeat_score,
            issues,
            opportunities,
            competitors,
            executive_summary,
        }
    }
}

impl ComprehensiveReport {
    /// Row shape for the `seo_audits` table
    pub fn to_new_audit(&self, duration_seconds: u64) -> NewSeoAudit {
        let lighthouse_scores = self.lighthouse.as_ref().map(|a| a.scores);
        let keyword_opportunities = self
            .opportunities
            .iter()
            .filter(|o| matches!(o, Opportunity::Keyword { .. }))
            .count();

        let extended_data = json!({
            "scores": self.scores,
            "eeat_score": self.eeat_score,
            "eeat_scores": self.eeat_breakdown,
            "backlinks": {
                "total": self.backlinks.as_ref().map_or(0, |b| b.total_backlinks),
                "referring_domains": self.backlinks.as_ref().map_or(0, |b| b.referring_domains),
                "domain_rating": self.backlinks.as_ref().map_or(0, |b| b.domain_rating),
                "rating_source": self.backlinks.as_ref().map(|b| b.rating_source),
            },
            "keywords": {
                "primary": self.primary_keyword,
                "suggestions": self.keyword_ideas.len(),
                "opportunities": keyword_opportunities,
            },
            "lighthouse_metrics": self.lighthouse.as_ref().map(|a| &a.metrics),
            "serp_features": self.serp.as_ref().map(|s| &s.features),
            "current_position": self.serp.as_ref().and_then(|s| s.current_position),
            "competitors": self.competitors,
            "opportunities": self.opportunities,
            "executive_summary": self.executive_summary,
            "audit_timestamp": timestamp(),
            "audit_duration_seconds": duration_seconds,
        });

        NewSeoAudit {
            url: self.url.clone(),
            score: self.overall_score,
            title: self.basic.title.clone(),
            meta_description: self.basic.meta_description.clone(),
            h1_tags: self.basic.h1_tags.clone(),
            meta_tags: self.basic.meta_tags.clone(),
            performance_score: self.scores.lighthouse.unwrap_or(0),
            accessibility_score: lighthouse_scores.and_then(|s| s.accessibility).unwrap_or(0),
            seo_score: lighthouse_scores.and_then(|s| s.seo).unwrap_or(0),
            issues: self.issues.clone(),
            extended_data,
        }
    }

    /// Response body once the row is stored
    pub fn into_response(self, audit_id: String, duration_seconds: u64) -> ComprehensiveResponse {
        ComprehensiveResponse {
            success: true,
            audit_id,
            company_id: self.company_id,
            url: self.url,
            overall_score: self.overall_score,
            scores: self.scores,
            eeat_score: self.eeat_score,
            issues_count: self.issues.len(),
            opportunities_count: self.opportunities.len(),
            competitors_count: self.competitors.len(),
            executive_summary: self.executive_summary,
            issues: self.issues.into_iter().take(RESPONSE_LIST_LIMIT).collect(),
            opportunities: self
                .opportunities
                .into_iter()
                .take(RESPONSE_LIST_LIMIT)
                .collect(),
            competitors: self.competitors,
            duration_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::backlinks::RatingSource;
    use crate::adapters::{
        AdapterResult, BacklinkAnalyzer, LighthouseAnalyzer, SerpAnalyzer, SerpResult,
        TextGenerator,
    };
    use crate::config::FetchConfig;
    use crate::error::AdapterFailure;
    use crate::models::{LighthouseMetrics, LighthouseOpportunity, LighthouseScores};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StubLighthouse;

    #[async_trait]
    impl LighthouseAnalyzer for StubLighthouse {
        async fn scores(&self, _url: &str, _strategy: Strategy) -> AdapterResult<LighthouseScores> {
            Err(AdapterFailure::NotConfigured)
        }

        async fn detailed(&self, _url: &str, _strategy: Strategy) -> AdapterResult<LighthouseAudit> {
            Ok(LighthouseAudit {
                scores: LighthouseScores {
                    performance: Some(40),
                    accessibility: Some(90),
                    best_practices: Some(80),
                    seo: Some(90),
                    pwa: None,
                },
                metrics: LighthouseMetrics::default(),
                opportunities: vec![LighthouseOpportunity {
                    id: "render-blocking-resources".to_string(),
                    title: "Eliminate render-blocking resources".to_string(),
                    description: "Inline critical CSS.".to_string(),
                    score: 0.3,
                }],
            })
        }
    }

    struct StubBacklinks;

    #[async_trait]
    impl BacklinkAnalyzer for StubBacklinks {
        async fn analyze(&self, domain: &str) -> AdapterResult<BacklinkProfile> {
            Ok(BacklinkProfile {
                domain: domain.to_string(),
                total_backlinks: 120,
                referring_domains: 12,
                domain_rating: 20,
                rating_source: RatingSource::Estimated,
            })
        }
    }

    struct StubSerp;

    #[async_trait]
    impl SerpAnalyzer for StubSerp {
        async fn analyze(&self, keyword: &str, _current_domain: &str) -> AdapterResult<SerpAnalysis> {
            let top_results = (1..=6)
                .map(|position| SerpResult {
                    position,
                    url: format!("https://rival{}.example/", position),
                    domain: format!("rival{}.example", position),
                    title: "Rival".to_string(),
                    description: String::new(),
                    domain_rating: 50,
                    has_schema: false,
                    content_type: "Informational".to_string(),
                })
                .collect();
            Ok(SerpAnalysis {
                keyword: keyword.to_string(),
                features: Vec::new(),
                top_results,
                avg_domain_rating: 50,
                current_position: None,
            })
        }
    }

    /// Replies by prompt shape and records every prompt
    #[derive(Default)]
    struct ScriptedAi {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedAi {
        async fn generate(&self, prompt: &str, _max: u32, _temp: f32) -> AdapterResult<String> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            if prompt.starts_with("Given this business") {
                Ok("\"emergency plumber\"".to_string())
            } else if prompt.starts_with("Generate") {
                Ok(r#"[{"keyword": "24 hour plumber", "searchVolume": 2400, "difficulty": 30, "relevance": 90},
                       {"keyword": "plumber near me", "searchVolume": 90000, "difficulty": 85, "relevance": 95}]"#
                    .to_string())
            } else {
                Err(AdapterFailure::RateLimited)
            }
        }
    }

    async fn site() -> MockServer {
        let server = MockServer::start().await;
        let html = format!(
            r#"<html><head><title>Acme Plumbing - Emergency Plumbers in Town</title>
            <meta name="viewport" content="width=device-width"></head>
            <body><h1>Acme</h1><img src="a.png"><p>{}</p></body></html>"#,
            vec!["pipe"; 320].join(" ")
        );
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
            .mount(&server)
            .await;
        server
    }

    fn company(website: &str) -> Company {
        Company::new("Acme Plumbing", website, Some("plumbing".to_string())).unwrap()
    }

    fn auditor(adapters: Adapters) -> CompositeAuditor {
        CompositeAuditor::new(
            BasicAuditor::new(&FetchConfig::default()).unwrap(),
            adapters,
            Strategy::Mobile,
        )
    }

    #[test]
    fn test_blend_renormalises_over_present() {
        let all = CategoryScores {
            lighthouse: Some(80),
            technical_seo: Some(60),
            content: Some(100),
            backlinks: Some(40),
            eeat: Some(50),
        };
        // 20 + 12 + 15 + 8 + 10
        assert_eq!(all.blend(), 65);

        let partial = CategoryScores {
            lighthouse: None,
            backlinks: None,
            ..all
        };
        // (12 + 15 + 10) / 0.55
        assert_eq!(partial.blend(), 67);

        assert_eq!(CategoryScores::default().blend(), 0);
    }

    #[test]
    fn test_content_score() {
        let mut basic = crate::audit::basic::analyze_page(
            "https://acme.example/",
            "<html><head><title>Short</title></head><body><h1>A</h1><h1>B</h1><img src=x></body></html>",
        );
        // short title, no description, two H1s, one accessibility issue
        assert_eq!(content_score(&basic), 100 - 15 - 15 - 10 - 5);

        basic.issues.extend(
            (0..10).map(|_| AuditIssue::new(IssueType::Warning, "accessibility", "x", Impact::Medium)),
        );
        assert_eq!(content_score(&basic), 100 - 15 - 15 - 10 - 25);
    }

    #[test]
    fn test_keyword_opportunity_filter_and_score() {
        let ideas = vec![
            KeywordIdea {
                keyword: "drain unblocking".to_string(),
                search_volume: 2400.0,
                difficulty: 30.0,
                relevance: 80.0,
            },
            KeywordIdea {
                keyword: "plumber".to_string(),
                search_volume: 90000.0,
                difficulty: 85.0,
                relevance: 99.0,
            },
            KeywordIdea {
                keyword: "tiny niche".to_string(),
                search_volume: 50.0,
                difficulty: 5.0,
                relevance: 40.0,
            },
        ];
        let opportunities = collect_opportunities(&ideas, None, &CategoryScores::default());
        assert_eq!(opportunities.len(), 1);
        match &opportunities[0] {
            Opportunity::Keyword {
                opportunity_score,
                recommendation,
                ..
            } => {
                assert_eq!(*opportunity_score, 2);
                assert_eq!(
                    recommendation,
                    "Target \"drain unblocking\" - 2400 monthly searches, 30% difficulty"
                );
            }
            other => panic!("unexpected opportunity {:?}", other),
        }
        let json = serde_json::to_value(&opportunities[0]).unwrap();
        assert_eq!(json["type"], "keyword");
    }

    #[tokio::test]
    async fn test_full_pipeline_with_every_adapter() {
        let server = site().await;
        let ai = Arc::new(ScriptedAi::default());
        let adapters = Adapters {
            lighthouse: Some(Arc::new(StubLighthouse)),
            crawl: None,
            backlinks: Some(Arc::new(StubBacklinks)),
            serp: Some(Arc::new(StubSerp)),
            ai: Some(ai.clone()),
        };

        let report = auditor(adapters).run(&company(&server.uri())).await;

        assert_eq!(report.primary_keyword, "emergency plumber");
        assert_eq!(report.keyword_ideas.len(), 2);
        // (40 + 90 + 90 + 80) / 4
        assert_eq!(report.scores.lighthouse, Some(75));
        assert_eq!(report.scores.backlinks, Some(20));
        assert!(report.scores.eeat.is_some());
        assert_eq!(report.competitors.len(), 5);
        assert_eq!(report.overall_score, report.scores.blend());

        let categories: Vec<&str> = report.issues.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(categories[0], "performance");
        assert_eq!(report.issues[0].impact, Impact::High);
        for expected in ["authority", "backlinks", "keywords", "competition"] {
            assert!(categories.contains(&expected), "missing {}", expected);
        }
        assert!(report
            .issues
            .iter()
            .filter(|i| i.category == "meta")
            .all(|i| i.url.as_deref() == Some(report.url.as_str())));

        // one keyword, five backlink and one technical opportunity
        assert_eq!(report.opportunities.len(), 7);
        assert!(matches!(
            report.opportunities.last(),
            Some(Opportunity::Technical { current_score: 75, .. })
        ));

        // the summary request fails, so the fallback sentence is used
        assert_eq!(
            report.executive_summary,
            fallback_summary(
                &report.url,
                report.overall_score,
                report.issues.len(),
                report.opportunities.len()
            )
        );
        let prompts = ai.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("\"Acme Plumbing\" in the plumbing industry"));
    }

    #[tokio::test]
    async fn test_no_adapters_uses_fallbacks() {
        let server = site().await;
        let report = auditor(Adapters::default()).run(&company(&server.uri())).await;

        assert_eq!(report.primary_keyword, "Acme Plumbing");
        assert!(report.keyword_ideas.is_empty());
        assert_eq!(report.scores.lighthouse, None);
        assert_eq!(report.scores.backlinks, None);
        assert!(report.competitors.is_empty());
        assert!(report
            .issues
            .iter()
            .any(|i| i.category == "keywords" && i.impact == Impact::Low));
        assert!(report.executive_summary.starts_with("Audit completed for"));

        let row = report.to_new_audit(3);
        assert_eq!(row.performance_score, 0);
        assert_eq!(row.seo_score, 0);
        assert_eq!(row.extended_data["backlinks"]["domain_rating"], 0);
        assert_eq!(row.extended_data["keywords"]["primary"], "Acme Plumbing");
        assert_eq!(row.extended_data["audit_duration_seconds"], 3);
        assert!(row.extended_data["scores"]["lighthouse"].is_null());
    }

    #[tokio::test]
    async fn test_unreachable_site_scores_zero_content() {
        let report = auditor(Adapters::default())
            .run(&company("http://127.0.0.1:1/"))
            .await;
        assert_eq!(report.scores.technical_seo, Some(0));
        assert_eq!(report.scores.content, Some(0));
        assert!(report.issues.iter().any(|i| i.category == "connectivity"));
    }

    #[test]
    fn test_response_truncates_lists() {
        let basic = crate::audit::basic::analyze_page("https://acme.example/", "<html></html>");
        let issues: Vec<AuditIssue> = (0..15)
            .map(|i| AuditIssue::new(IssueType::Info, "meta", format!("issue {}", i), Impact::Low))
            .collect();
        let report = ComprehensiveReport {
            company_id: "c1".to_string(),
            url: "https://acme.example/".to_string(),
            primary_keyword: "acme".to_string(),
            eeat_breakdown: eeat::calculate(&basic, None),
            basic,
            lighthouse: None,
            backlinks: None,
            keyword_ideas: Vec::new(),
            serp: None,
            scores: CategoryScores::default(),
            overall_score: 0,
            eeat_score: 0,
            issues,
            opportunities: Vec::new(),
            competitors: Vec::new(),
            executive_summary: "done".to_string(),
        };

        let response = report.into_response("a1".to_string(), 4);
        assert!(response.success);
        assert_eq!(response.issues_count, 15);
        assert_eq!(response.issues.len(), 10);
        assert_eq!(response.duration_seconds, 4);
    }
}
