//! Audit and comprehensive commands

use crate::audit::{AuditOptions, AuditReport, AuditRequest, AuditService, ComprehensiveResponse};
use crate::audit::comprehensive::Opportunity;
use crate::error::{Error, Result};
use crate::models::{AuditIssue, SeoAudit, Strategy};
use crate::progress::{finish_spinner, spinner};
use tracing::info;
use url::Url;

/// Options for `sitescore audit`
#[derive(Debug, Clone)]
pub struct AuditCommandOptions {
    pub include_lighthouse: bool,
    pub include_crawl: bool,
    pub strategy: Option<Strategy>,
    /// Persist the result under this company
    pub company_id: Option<String>,
    pub quiet: bool,
}

/// Either a one-off report or the row stored for a company
#[derive(Debug, Clone)]
pub enum AuditOutcome {
    Report(Box<AuditReport>),
    Stored(Box<SeoAudit>),
}

fn check_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!("Only http(s) URLs can be audited: {}", url)));
    }
    Ok(())
}

/// Run the enhanced audit for a URL, optionally storing it for a company
pub async fn cmd_audit(
    service: &AuditService,
    url: &str,
    options: AuditCommandOptions,
) -> Result<AuditOutcome> {
    check_url(url)?;
    let bar = spinner(format!("Auditing {}", url), options.quiet);

    let outcome = match options.company_id {
        Some(company_id) => {
            let request = AuditRequest {
                url: Some(url.to_string()),
                include_lighthouse: Some(options.include_lighthouse),
                include_crawl: Some(options.include_crawl),
                strategy: options.strategy,
            };
            let stored = service
                .audit_company(&company_id, &request)
                .await
                .inspect_err(|_| bar.finish_and_clear())?;
            finish_spinner(
                &bar,
                format!("✓ Stored audit {} (score {})", stored.id, stored.audit.score),
            );
            AuditOutcome::Stored(Box::new(stored))
        }
        None => {
            let audit_options = AuditOptions {
                include_lighthouse: options.include_lighthouse,
                include_crawl: options.include_crawl,
                strategy: options.strategy.unwrap_or(service.default_strategy()),
            };
            let report = service.audit_url(url, &audit_options).await;
            finish_spinner(&bar, format!("✓ Audited {} (score {})", url, report.overall_score));
            info!(url, score = report.overall_score, "Audit finished");
            AuditOutcome::Report(Box::new(report))
        }
    };

    Ok(outcome)
}

/// Run and store the comprehensive audit for a company
pub async fn cmd_comprehensive(
    service: &AuditService,
    company_id: &str,
    quiet: bool,
) -> Result<ComprehensiveResponse> {
    let bar = spinner("Running comprehensive audit", quiet);
    let response = service
        .comprehensive(company_id)
        .await
        .inspect_err(|_| bar.finish_and_clear())?;
    finish_spinner(
        &bar,
        format!("✓ Comprehensive audit stored (score {})", response.overall_score),
    );
    Ok(response)
}

fn print_issues(issues: &[AuditIssue]) {
    if issues.is_empty() {
        println!("\nNo issues found.");
        return;
    }
    println!("\nIssues ({}):", issues.len());
    for issue in issues {
        println!("  • [{}] {}: {}", issue.impact, issue.category, issue.message);
        if let Some(rec) = &issue.recommendation {
            println!("    → {}", rec);
        }
    }
}

/// Print an unstored audit report to console
pub fn print_audit_report(report: &AuditReport) {
    println!("\n🔎 SEO audit: {}\n", report.url);
    println!("Overall score: {}/100", report.overall_score);
    println!("  On-page:        {}", report.basic.seo_score);
    println!("  Performance:    {}", report.performance_score());
    println!("  Accessibility:  {}", report.accessibility_score());
    println!("  Best practices: {}", report.best_practices_score());
    println!("  Word count:     {}", report.word_count());
    println!(
        "  E-E-A-T:        experience {}, expertise {}, authoritativeness {}, trustworthiness {}",
        report.eeat.experience,
        report.eeat.expertise,
        report.eeat.authoritativeness,
        report.eeat.trustworthiness
    );
    if report.lighthouse.is_none() {
        println!("  (PageSpeed data unavailable; performance is a placeholder)");
    }

    print_issues(&report.issues);

    if !report.basic.recommendations.is_empty() {
        println!("\nNext steps:");
        for hint in &report.basic.recommendations {
            println!("  • {}", hint);
        }
    }

    if !report.recommendations.is_empty() {
        println!("\nRecommendations:");
        for rec in &report.recommendations {
            println!("  • {} ({}): {}", rec.title, rec.priority, rec.description);
        }
    }
}

fn score_or_na(score: Option<u32>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| s.to_string())
}

/// Print a comprehensive audit response to console
pub fn print_comprehensive(response: &ComprehensiveResponse) {
    println!("\n📈 Comprehensive audit: {}\n", response.url);
    println!("Audit ID: {}", response.audit_id);
    println!("Overall score: {}/100", response.overall_score);
    println!("  Lighthouse:    {}", score_or_na(response.scores.lighthouse));
    println!("  Technical SEO: {}", score_or_na(response.scores.technical_seo));
    println!("  Content:       {}", score_or_na(response.scores.content));
    println!("  Backlinks:     {}", score_or_na(response.scores.backlinks));
    println!("  E-E-A-T:       {}", response.eeat_score);
    println!("Duration: {}s", response.duration_seconds);

    println!("\nSummary:\n  {}", response.executive_summary);

    print_issues(&response.issues);
    if response.issues_count > response.issues.len() {
        println!("  … and {} more", response.issues_count - response.issues.len());
    }

    if !response.opportunities.is_empty() {
        println!("\nOpportunities ({}):", response.opportunities_count);
        for opportunity in &response.opportunities {
            match opportunity {
                Opportunity::Keyword {
                    keyword,
                    search_volume,
                    difficulty,
                    ..
                } => println!(
                    "  • keyword \"{}\" (volume {}, difficulty {})",
                    keyword, search_volume, difficulty
                ),
                Opportunity::Backlink {
                    domain,
                    domain_rating,
                    ..
                } => println!("  • backlink from {} (DR {})", domain, domain_rating),
                Opportunity::Technical {
                    category,
                    current_score,
                    target_score,
                    ..
                } => println!(
                    "  • {} {} → {}",
                    category, current_score, target_score
                ),
            }
        }
    }

    if !response.competitors.is_empty() {
        println!("\nCompetitors:");
        for competitor in &response.competitors {
            println!(
                "  #{} {} (DR {})",
                competitor.position, competitor.domain, competitor.domain_rating
            );
        }
    }
}
