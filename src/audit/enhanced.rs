//! Enhanced audit: basic checks plus optional Lighthouse and crawl, run concurrently

use super::aggregate::{aggregate, AuditReport};
use super::basic::BasicAuditor;
use crate::adapters::{settle, Adapters, ContentCrawler, LighthouseAnalyzer};
use crate::models::Strategy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Which optional sources to include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOptions {
    #[serde(default = "default_true")]
    pub include_lighthouse: bool,
    #[serde(default = "default_true")]
    pub include_crawl: bool,
    #[serde(default)]
    pub strategy: Strategy,
}

fn default_true() -> bool {
    true
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            include_lighthouse: true,
            include_crawl: true,
            strategy: Strategy::Mobile,
        }
    }
}

/// Runs the enhanced audit; built once and shared
#[derive(Clone)]
pub struct EnhancedAuditor {
    basic: BasicAuditor,
    lighthouse: Option<Arc<dyn LighthouseAnalyzer>>,
    crawl: Option<Arc<dyn ContentCrawler>>,
}

impl EnhancedAuditor {
    pub fn new(basic: BasicAuditor, adapters: &Adapters) -> Self {
        Self {
            basic,
            lighthouse: adapters.lighthouse.clone(),
            crawl: adapters.crawl.clone(),
        }
    }

    /// Audit a URL. Adapter failures degrade the report, they never fail it.
    pub async fn audit_website(&self, url: &str, options: &AuditOptions) -> AuditReport {
        let started = Instant::now();
        info!(url, strategy = %options.strategy, "Starting enhanced audit");

        let lighthouse = async {
            match (&self.lighthouse, options.include_lighthouse) {
                (Some(analyzer), true) => {
                    settle("lighthouse", analyzer.scores(url, options.strategy)).await
                }
                _ => None,
            }
        };
        let crawl = async {
            match (&self.crawl, options.include_crawl) {
                (Some(crawler), true) => settle("crawl", crawler.scrape(url)).await,
                _ => None,
            }
        };

        let (basic, lighthouse, crawl) = tokio::join!(self.basic.audit(url), lighthouse, crawl);

        let report = aggregate(url, options.strategy, basic, lighthouse, crawl);
        info!(
            url,
            overall_score = report.overall_score,
            lighthouse = report.lighthouse.is_some(),
            crawl = report.crawl.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enhanced audit completed"
        );
        report
    }
}
