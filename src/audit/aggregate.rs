//! Merge basic, Lighthouse and crawl output into one report
//!
//! The overall score is the mean of whichever sub-scores are actually
//! present. Missing adapters shrink the denominator instead of contributing
//! zeros.

use super::eeat;
use crate::models::{
    AuditIssue, BasicAuditResult, CrawlResult, EeatScores, Impact, LighthouseScores,
    NewSeoAudit, Recommendation, Strategy,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Lighthouse performance below this adds a page speed recommendation
pub const PERFORMANCE_TARGET: u32 = 80;

/// Crawled pages shorter than this get a content recommendation
pub const CONTENT_WORD_TARGET: usize = 500;

/// Best practices score stored when Lighthouse did not run
pub const PLACEHOLDER_BEST_PRACTICES: u32 = 85;

/// Rounded mean of the finite values present, `None` when nothing is present
pub fn mean_of_present<I>(values: I) -> Option<u32>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if present.is_empty() {
        return None;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    Some(mean.round().clamp(0.0, 100.0) as u32)
}

/// Overall score from present Lighthouse sub-scores and the E-E-A-T breakdown
pub fn overall_score(lighthouse: Option<&LighthouseScores>, eeat: &EeatScores) -> u32 {
    let lighthouse_values = lighthouse
        .map(|scores| scores.core().to_vec())
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.map(f64::from));
    let eeat_values = eeat.as_array().into_iter().map(|v| Some(f64::from(v)));
    mean_of_present(lighthouse_values.chain(eeat_values)).unwrap_or(0)
}

/// Group issues and adapter findings into prioritised advice
pub fn build_recommendations(
    critical: &[AuditIssue],
    warnings: &[AuditIssue],
    lighthouse: Option<&LighthouseScores>,
    crawl: Option<&CrawlResult>,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if !critical.is_empty() {
        recommendations.push(Recommendation {
            priority: Impact::High,
            category: "critical-fixes".to_string(),
            title: "Fix Critical SEO Issues".to_string(),
            description: format!(
                "You have {} critical issues that need immediate attention.",
                critical.len()
            ),
            issues: critical.iter().map(|i| i.message.clone()).collect(),
        });
    }

    if !warnings.is_empty() {
        recommendations.push(Recommendation {
            priority: Impact::Medium,
            category: "improvements".to_string(),
            title: "Recommended Improvements".to_string(),
            description: format!(
                "{} improvements that will enhance your SEO performance.",
                warnings.len()
            ),
            issues: warnings.iter().map(|i| i.message.clone()).collect(),
        });
    }

    if lighthouse
        .and_then(|s| s.performance)
        .is_some_and(|p| p < PERFORMANCE_TARGET)
    {
        recommendations.push(Recommendation {
            priority: Impact::High,
            category: "performance".to_string(),
            title: "Improve Page Speed".to_string(),
            description: "Your page speed score is below recommended levels. Consider optimizing images, minifying CSS/JS, and enabling caching.".to_string(),
            issues: Vec::new(),
        });
    }

    if crawl.is_some_and(|c| c.word_count < CONTENT_WORD_TARGET) {
        recommendations.push(Recommendation {
            priority: Impact::Medium,
            category: "content".to_string(),
            title: "Add More Content".to_string(),
            description: "Pages with more comprehensive content (500+ words) tend to rank better in search results.".to_string(),
            issues: Vec::new(),
        });
    }

    recommendations
}

/// Aggregated result of an enhanced audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub url: String,
    pub strategy: Strategy,
    pub basic: BasicAuditResult,
    pub lighthouse: Option<LighthouseScores>,
    pub crawl: Option<CrawlResult>,
    pub issues: Vec<AuditIssue>,
    pub critical_issues: Vec<AuditIssue>,
    pub warnings: Vec<AuditIssue>,
    pub eeat: EeatScores,
    pub overall_score: u32,
    pub recommendations: Vec<Recommendation>,
}

/// Combine the three sources; any of the adapter results may be absent
pub fn aggregate(
    url: &str,
    strategy: Strategy,
    basic: BasicAuditResult,
    lighthouse: Option<LighthouseScores>,
    crawl: Option<CrawlResult>,
) -> AuditReport {
    let issues = basic.issues.clone();
    let critical_issues: Vec<AuditIssue> = issues
        .iter()
        .filter(|i| i.impact == Impact::High)
        .cloned()
        .collect();
    let warnings: Vec<AuditIssue> = issues
        .iter()
        .filter(|i| i.impact == Impact::Medium)
        .cloned()
        .collect();

    let eeat = eeat::calculate(&basic, crawl.as_ref());
    let overall_score = overall_score(lighthouse.as_ref(), &eeat);
    let recommendations =
        build_recommendations(&critical_issues, &warnings, lighthouse.as_ref(), crawl.as_ref());

    AuditReport {
        url: url.to_string(),
        strategy,
        basic,
        lighthouse,
        crawl,
        issues,
        critical_issues,
        warnings,
        eeat,
        overall_score,
        recommendations,
    }
}

impl AuditReport {
    fn lighthouse_field(&self, pick: fn(&LighthouseScores) -> Option<u32>) -> Option<u32> {
        self.lighthouse.as_ref().and_then(pick)
    }

    pub fn performance_score(&self) -> u32 {
        self.lighthouse_field(|s| s.performance)
            .unwrap_or(self.basic.performance_score)
    }

    pub fn accessibility_score(&self) -> u32 {
        self.lighthouse_field(|s| s.accessibility)
            .unwrap_or(self.basic.accessibility_score)
    }

    pub fn seo_score(&self) -> u32 {
        self.lighthouse_field(|s| s.seo).unwrap_or(self.basic.seo_score)
    }

    pub fn best_practices_score(&self) -> u32 {
        self.lighthouse_field(|s| s.best_practices)
            .unwrap_or(PLACEHOLDER_BEST_PRACTICES)
    }

    /// Crawl word count when crawled, otherwise the fetched page's
    pub fn word_count(&self) -> usize {
        self.crawl
            .as_ref()
            .map(|c| c.word_count)
            .unwrap_or(self.basic.word_count)
    }

    /// Page speed keyed by the strategy Lighthouse ran with
    fn page_speed(&self, strategy: Strategy) -> Option<u32> {
        let measured = if self.strategy == strategy {
            self.lighthouse_field(|s| s.performance)
        } else {
            None
        };
        match strategy {
            Strategy::Mobile => Some(measured.unwrap_or(self.basic.performance_score)),
            Strategy::Desktop => measured,
        }
    }

    /// Row shape for the `seo_audits` table
    pub fn to_new_audit(&self) -> NewSeoAudit {
        let extended_data: Value = json!({
            "best_practices_score": self.best_practices_score(),
            "pwa_score": self.lighthouse_field(|s| s.pwa),
            "eeat_scores": self.eeat,
            "page_speed_mobile": self.page_speed(Strategy::Mobile),
            "page_speed_desktop": self.page_speed(Strategy::Desktop),
            "mobile_friendly": self.basic.mobile_friendly,
            "https_enabled": self.basic.https,
            "word_count": self.word_count(),
            "critical_issues": self.critical_issues,
            "warnings": self.warnings,
            "recommendations": self.recommendations,
            "lighthouse_data": self.lighthouse,
            "crawl_data": self.crawl,
        });

        NewSeoAudit {
            url: self.url.clone(),
            score: self.overall_score,
            title: self.basic.title.clone(),
            meta_description: self.basic.meta_description.clone(),
            h1_tags: self.basic.h1_tags.clone(),
            meta_tags: Default::default(),
            performance_score: self.performance_score(),
            accessibility_score: self.accessibility_score(),
            seo_score: self.seo_score(),
            issues: self.issues.clone(),
            extended_data,
        }
    }
}
