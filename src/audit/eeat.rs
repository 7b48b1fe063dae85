//! E-E-A-T proxy scoring
//!
//! These are heuristics over page signals, not a measure of real expertise.

use crate::adapters::BacklinkProfile;
use crate::models::{BasicAuditResult, CrawlResult, EeatScores, LighthouseScores};

const BASELINE: u32 = 70;
const CAP: u32 = 100;

fn bonus(condition: bool, points: u32) -> u32 {
    if condition {
        points
    } else {
        0
    }
}

/// Four-dimension breakdown, each in [70, 100]
pub fn calculate(basic: &BasicAuditResult, crawl: Option<&CrawlResult>) -> EeatScores {
    let crawl_words = crawl.map(|c| c.word_count).unwrap_or(0);
    let crawl_images = crawl.map(|c| c.images.len()).unwrap_or(0);
    let external_links = crawl.map(|c| c.links.external.len()).unwrap_or(0);

    let experience = BASELINE
        + bonus(basic.word_count > 500, 10)
        + bonus(basic.word_count > 1000, 10)
        + bonus(crawl_images > 3, 5);

    let expertise = BASELINE + bonus(crawl_words > 800, 10) + bonus(basic.h1_tags.len() == 1, 5);

    let authoritativeness =
        BASELINE + bonus(external_links > 5, 10) + bonus(external_links > 10, 5);

    let trustworthiness = BASELINE
        + bonus(basic.mobile_friendly, 10)
        + bonus(basic.https, 10)
        + bonus(basic.title.to_lowercase().contains("contact"), 5);

    EeatScores {
        experience: experience.min(CAP),
        expertise: expertise.min(CAP),
        authoritativeness: authoritativeness.min(CAP),
        trustworthiness: trustworthiness.min(CAP),
    }
}

/// Single 0-100 score used by the comprehensive audit
pub fn composite_score(
    basic: &BasicAuditResult,
    lighthouse: Option<&LighthouseScores>,
    backlinks: Option<&BacklinkProfile>,
    url: &str,
) -> u32 {
    let mut score = 0;

    score += bonus(!basic.h1_tags.is_empty(), 10);
    score += bonus(basic.meta_description.chars().count() >= 120, 10);
    score += bonus(
        basic.structured_data_count > 0 || basic.meta_tags.contains_key("og:type"),
        5,
    );

    if let Some(scores) = lighthouse {
        let at_least = |value: Option<u32>, threshold: u32| value.is_some_and(|v| v >= threshold);
        score += bonus(at_least(scores.accessibility, 90), 5);
        score += bonus(at_least(scores.seo, 90), 10);
        score += bonus(at_least(scores.best_practices, 90), 10);
        score += bonus(at_least(scores.best_practices, 80), 10);
    }

    if let Some(profile) = backlinks {
        score += ((profile.domain_rating as f64 / 4.0).round() as u32).min(25);
        score += bonus(profile.referring_domains > 50, 5);
    }

    let https = url::Url::parse(url)
        .map(|u| u.scheme() == "https")
        .unwrap_or(false);
    score += bonus(https, 10);

    score.min(CAP)
}
