//! Stored audit lookups

use crate::error::{Error, Result};
use crate::models::SeoAudit;
use crate::store::AuditDb;

/// Audits for a company, newest first
pub async fn cmd_history(db: &AuditDb, company_id: &str, limit: u32) -> Result<Vec<SeoAudit>> {
    db.require_company(company_id).await?;
    db.list_audits(company_id, limit).await
}

pub async fn cmd_show(db: &AuditDb, audit_id: &str) -> Result<SeoAudit> {
    db.get_audit(audit_id)
        .await?
        .ok_or_else(|| Error::AuditNotFound(audit_id.to_string()))
}

/// Print audit history to console
pub fn print_history(company_id: &str, audits: &[SeoAudit]) {
    println!("\n🗂  Audit history for {}\n", company_id);

    if audits.is_empty() {
        println!("No audits stored yet. Run 'sitescore comprehensive {}'.", company_id);
        return;
    }

    println!(
        "{:<28} {:>5} {:>5} {:>5} {:>5} {:>6}  ID",
        "Created", "Score", "Perf", "A11y", "SEO", "Issues"
    );
    for audit in audits {
        println!(
            "{:<28} {:>5} {:>5} {:>5} {:>5} {:>6}  {}",
            audit.created_at,
            audit.audit.score,
            audit.audit.performance_score,
            audit.audit.accessibility_score,
            audit.audit.seo_score,
            audit.audit.issues.len(),
            audit.id
        );
    }
}

/// Print one stored audit to console
pub fn print_audit_detail(audit: &SeoAudit) {
    let row = &audit.audit;
    println!("\n📄 Audit {}\n", audit.id);
    println!("Company: {}", audit.company_id);
    println!("URL: {}", row.url);
    println!("Created: {}", audit.created_at);
    println!("\nScore: {}/100", row.score);
    println!("  Performance:   {}", row.performance_score);
    println!("  Accessibility: {}", row.accessibility_score);
    println!("  SEO:           {}", row.seo_score);

    println!("\nTitle: {}", if row.title.is_empty() { "(none)" } else { &row.title });
    if !row.meta_description.is_empty() {
        println!("Description: {}", row.meta_description);
    }
    if !row.h1_tags.is_empty() {
        println!("H1: {}", row.h1_tags.join(" | "));
    }

    if let Some(summary) = row.extended_data.get("executive_summary").and_then(|v| v.as_str()) {
        println!("\nSummary:\n  {}", summary);
    }

    if row.issues.is_empty() {
        println!("\nNo issues recorded.");
    } else {
        println!("\nIssues ({}):", row.issues.len());
        for issue in &row.issues {
            println!("  • [{}] {}: {}", issue.impact, issue.category, issue.message);
        }
    }
}
