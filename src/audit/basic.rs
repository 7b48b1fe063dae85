//! Basic on-page auditor
//!
//! Fetches the page itself and runs fixed-deduction checks. Connectivity
//! failures never escape: they become a zero-score result carrying one
//! high-impact connectivity issue and remediation hints.

use crate::config::FetchConfig;
use crate::error::{FetchFailure, Result};
use crate::fetch::PageFetcher;
use crate::models::{AuditIssue, BasicAuditResult, Impact, IssueType};
use crate::parse::{parse_page, PageSignals};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const TITLE_MIN_CHARS: usize = 30;
pub const TITLE_MAX_CHARS: usize = 60;
pub const DESCRIPTION_MIN_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 160;
pub const MIN_WORD_COUNT: usize = 300;

/// Performance score reported before any Lighthouse data is merged in
pub const PLACEHOLDER_PERFORMANCE: u32 = 85;

/// Title used when the page could not be fetched
pub const UNREACHABLE_TITLE: &str = "Audit Limited - Site Access Restricted";

/// Page fetch plus on-page checks
#[derive(Clone)]
pub struct BasicAuditor {
    fetcher: PageFetcher,
}

impl BasicAuditor {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(config)?,
        })
    }

    /// Audit a URL. Always returns a result.
    pub async fn audit(&self, url: &str) -> BasicAuditResult {
        match self.fetcher.fetch(url).await {
            Ok(page) => {
                let result = analyze_page(url, &page.body);
                info!(
                    url,
                    seo_score = result.seo_score,
                    issues = result.issues.len(),
                    "Basic audit completed"
                );
                result
            }
            Err(failure) => {
                warn!(url, cause = %failure, "Basic audit could not fetch page");
                unreachable_result(url, &failure)
            }
        }
    }
}

fn is_https(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| u.scheme() == "https")
        .unwrap_or(false)
}

/// Run every on-page check against fetched HTML
pub fn analyze_page(url: &str, html: &str) -> BasicAuditResult {
    let signals = parse_page(html, url);
    let (issues, seo_score) = check_signals(&signals);
    let missing_alt = signals.images_missing_alt;

    BasicAuditResult {
        title: signals.title.clone().unwrap_or_default(),
        meta_description: signals.meta_description.clone().unwrap_or_default(),
        h1_tags: signals.h1_tags,
        mobile_friendly: signals.has_viewport,
        word_count: signals.word_count,
        image_count: signals.image_count,
        https: is_https(url),
        has_canonical: signals.canonical.is_some(),
        structured_data_count: signals.structured_data_count,
        meta_tags: signals.meta_tags,
        issues,
        seo_score,
        performance_score: PLACEHOLDER_PERFORMANCE,
        accessibility_score: accessibility_score(missing_alt),
        recommendations: Vec::new(),
    }
}

/// 95 with every image described, minus 3 per undescribed image, never below 60
pub fn accessibility_score(images_missing_alt: usize) -> u32 {
    if images_missing_alt == 0 {
        return 95;
    }
    let penalty = images_missing_alt.saturating_mul(3).min(95) as u32;
    95u32.saturating_sub(penalty).max(60)
}

/// Issues and the resulting score, starting from 100 and floored at 0
pub fn check_signals(signals: &PageSignals) -> (Vec<AuditIssue>, u32) {
    let mut issues = Vec::new();
    let mut deductions: u32 = 0;

    match &signals.title {
        None => {
            issues.push(AuditIssue::new(
                IssueType::Error,
                "meta",
                "Missing page title",
                Impact::High,
            ));
            deductions += 10;
        }
        Some(title) => {
            let len = title.chars().count();
            if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
                issues.push(AuditIssue::new(
                    IssueType::Warning,
                    "meta",
                    format!(
                        "Title length ({}) should be between {}-{} characters",
                        len, TITLE_MIN_CHARS, TITLE_MAX_CHARS
                    ),
                    Impact::Medium,
                ));
                deductions += 5;
            }
        }
    }

    match &signals.meta_description {
        None => {
            issues.push(AuditIssue::new(
                IssueType::Error,
                "meta",
                "Missing meta description",
                Impact::High,
            ));
            deductions += 10;
        }
        Some(description) => {
            let len = description.chars().count();
            if !(DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&len) {
                issues.push(AuditIssue::new(
                    IssueType::Warning,
                    "meta",
                    format!(
                        "Meta description length ({}) should be between {}-{} characters",
                        len, DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS
                    ),
                    Impact::Medium,
                ));
                deductions += 5;
            }
        }
    }

    match signals.h1_tags.len() {
        0 => {
            issues.push(AuditIssue::new(
                IssueType::Error,
                "content",
                "No H1 tag found",
                Impact::High,
            ));
            deductions += 10;
        }
        1 => {}
        n => {
            issues.push(AuditIssue::new(
                IssueType::Warning,
                "content",
                format!("Multiple H1 tags found ({}). Recommended: 1", n),
                Impact::Medium,
            ));
            deductions += 5;
        }
    }

    if !signals.has_viewport {
        issues.push(AuditIssue::new(
            IssueType::Error,
            "mobile",
            "Missing viewport meta tag - page may not be mobile-friendly",
            Impact::High,
        ));
        deductions += 10;
    }

    if signals.images_missing_alt > 0 {
        issues.push(AuditIssue::new(
            IssueType::Warning,
            "accessibility",
            format!("{} images missing alt text", signals.images_missing_alt),
            Impact::Medium,
        ));
        deductions += signals.images_missing_alt.saturating_mul(2).min(10) as u32;
    }

    if signals.canonical.is_none() {
        issues.push(AuditIssue::new(
            IssueType::Info,
            "meta",
            "No canonical tag found",
            Impact::Low,
        ));
        deductions += 2;
    }

    if signals.structured_data_count == 0 {
        issues.push(AuditIssue::new(
            IssueType::Info,
            "structured-data",
            "No structured data (Schema.org) found",
            Impact::Medium,
        ));
        deductions += 5;
    }

    if signals.word_count < MIN_WORD_COUNT {
        issues.push(AuditIssue::new(
            IssueType::Warning,
            "content",
            format!(
                "Low word count ({}). Recommended: {}+ words",
                signals.word_count, MIN_WORD_COUNT
            ),
            Impact::Medium,
        ));
        deductions += 5;
    }

    (issues, 100u32.saturating_sub(deductions))
}

/// Zero-score placeholder for a page that could not be fetched
pub fn unreachable_result(url: &str, failure: &FetchFailure) -> BasicAuditResult {
    let message = failure.to_string();
    BasicAuditResult {
        title: UNREACHABLE_TITLE.to_string(),
        meta_description: message.clone(),
        h1_tags: Vec::new(),
        mobile_friendly: false,
        word_count: 0,
        image_count: 0,
        https: is_https(url),
        has_canonical: false,
        structured_data_count: 0,
        meta_tags: BTreeMap::new(),
        issues: vec![AuditIssue::new(
            IssueType::Error,
            "connectivity",
            message,
            Impact::High,
        )],
        seo_score: 0,
        performance_score: 0,
        accessibility_score: 0,
        recommendations: failure.remediation(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    /// A page that passes every check unless overridden
    fn page(head: &str, body: &str) -> String {
        format!("<!DOCTYPE html><html><head>{}</head><body>{}</body></html>", head, body)
    }

    fn clean_head(title: &str) -> String {
        format!(
            r#"<title>{}</title>
            <meta name="description" content="{}">
            <meta name="viewport" content="width=device-width">
            <link rel="canonical" href="https://site.example/">
            <script type="application/ld+json">{{"@type": "Organization"}}</script>"#,
            title,
            "d".repeat(140)
        )
    }

    #[test]
    fn test_clean_page_scores_100() {
        let html = page(&clean_head(&"t".repeat(45)), &format!("<h1>Hi</h1><p>{}</p>", words(400)));
        let result = analyze_page("https://site.example/", &html);
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert_eq!(result.seo_score, 100);
        assert_eq!(result.performance_score, 85);
        assert_eq!(result.accessibility_score, 95);
        assert!(result.mobile_friendly);
        assert!(result.https);
    }

    #[test]
    fn test_title_length_boundaries() {
        for (len, expected_issues) in [(45, 0), (30, 0), (60, 0), (20, 1), (70, 1)] {
            let html = page(&clean_head(&"t".repeat(len)), &format!("<h1>Hi</h1><p>{}</p>", words(400)));
            let result = analyze_page("https://site.example/", &html);
            let title_issues: Vec<_> = result
                .issues
                .iter()
                .filter(|i| i.message.starts_with("Title length"))
                .collect();
            assert_eq!(title_issues.len(), expected_issues, "title length {}", len);
            if expected_issues == 1 {
                assert_eq!(title_issues[0].impact, Impact::Medium);
                assert_eq!(title_issues[0].category, "meta");
            }
        }
    }

    #[test]
    fn test_documented_example_scores_81() {
        let head = format!(
            r#"<title>{}</title>
            <meta name="viewport" content="width=device-width">
            <link rel="canonical" href="https://site.example/">
            <script type="application/ld+json">{{}}</script>"#,
            "t".repeat(25)
        );
        let body = format!(
            r#"<h1>One heading</h1><img src="a.png"><img src="b.png"><p>{}</p>"#,
            words(400)
        );
        let result = analyze_page("https://site.example/", &page(&head, &body));

        let summary: Vec<(&str, Impact)> = result
            .issues
            .iter()
            .map(|i| (i.category.as_str(), i.impact))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("meta", Impact::Medium),
                ("meta", Impact::High),
                ("accessibility", Impact::Medium),
            ]
        );
        assert_eq!(result.seo_score, 81);
        assert_eq!(result.accessibility_score, 89);
    }

    #[test]
    fn test_bare_page_deductions() {
        let html = "<html><body>".to_string() + &"<img src=x>".repeat(50) + "</body></html>";
        let result = analyze_page("http://bare.example/", &html);
        // 10+10+10+10+10+2+5+5 = 62 deducted at most
        assert_eq!(result.seo_score, 38);
        assert!(result.seo_score <= 100);
        assert_eq!(result.accessibility_score, 60);
        assert!(!result.https);
    }

    #[test]
    fn test_multiple_h1_is_medium() {
        let html = page(&clean_head(&"t".repeat(45)), &format!("<h1>A</h1><h1>B</h1><p>{}</p>", words(400)));
        let result = analyze_page("https://site.example/", &html);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].impact, Impact::Medium);
        assert_eq!(result.seo_score, 95);
    }

    #[test]
    fn test_accessibility_score_curve() {
        assert_eq!(accessibility_score(0), 95);
        assert_eq!(accessibility_score(1), 92);
        assert_eq!(accessibility_score(11), 62);
        assert_eq!(accessibility_score(12), 60);
        assert_eq!(accessibility_score(usize::MAX), 60);
    }

    #[tokio::test]
    async fn test_unreachable_url_yields_placeholder() {
        let auditor = BasicAuditor::new(&FetchConfig::default()).unwrap();
        let result = auditor.audit("http://127.0.0.1:1/").await;

        assert_eq!(result.seo_score, 0);
        assert_eq!(result.performance_score, 0);
        assert_eq!(result.accessibility_score, 0);
        assert_eq!(result.title, UNREACHABLE_TITLE);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].category, "connectivity");
        assert_eq!(result.issues[0].impact, Impact::High);
        assert_eq!(result.meta_description, result.issues[0].message);
        assert!(!result.recommendations.is_empty());
        assert!(result.is_unreachable());
    }

    #[tokio::test]
    async fn test_blocked_site_gets_pagespeed_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let auditor = BasicAuditor::new(&FetchConfig::default()).unwrap();
        let result = auditor.audit(&format!("{}/", server.uri())).await;
        assert_eq!(
            result.meta_description,
            "Website is blocking automated requests (403 Forbidden)"
        );
        assert!(result.recommendations.iter().any(|r| r.contains("pagespeed.web.dev")));
    }

    #[tokio::test]
    async fn test_audit_fetched_page() {
        let server = MockServer::start().await;
        let html = page(&clean_head(&"t".repeat(45)), &format!("<h1>Hi</h1><p>{}</p>", words(350)));
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html.into_bytes(), "text/html"))
            .mount(&server)
            .await;

        let auditor = BasicAuditor::new(&FetchConfig::default()).unwrap();
        let result = auditor.audit(&format!("{}/", server.uri())).await;
        assert_eq!(result.seo_score, 100);
        assert_eq!(result.word_count, 351);
        assert!(!result.https);
    }
}
