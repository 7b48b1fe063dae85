//! Audit pipelines
//!
//! - `basic`: self-hosted fetch and on-page checks
//! - `eeat`: E-E-A-T proxy scores
//! - `aggregate`: merge sources into one report and a storable row
//! - `enhanced`: basic + optional Lighthouse + optional crawl
//! - `comprehensive`: two-stage composite audit with weighted blend
//!
//! [`AuditService`] ties the pipelines to the store and is what the CLI, the
//! HTTP API and the MCP server call.

pub mod aggregate;
pub mod basic;
pub mod comprehensive;
pub mod eeat;
pub mod enhanced;

pub use aggregate::AuditReport;
pub use basic::BasicAuditor;
pub use comprehensive::{ComprehensiveReport, ComprehensiveResponse, CompositeAuditor};
pub use enhanced::{AuditOptions, EnhancedAuditor};

use crate::adapters::Adapters;
use crate::config::Config;
use crate::error::Result;
use crate::models::{SeoAudit, Strategy};
use crate::store::AuditDb;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

/// Body of an enhanced audit request for a registered company
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRequest {
    /// Defaults to the company website
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub include_lighthouse: Option<bool>,
    #[serde(default)]
    pub include_crawl: Option<bool>,
    #[serde(default)]
    pub strategy: Option<Strategy>,
}

impl AuditRequest {
    fn options(&self, default_strategy: Strategy) -> AuditOptions {
        AuditOptions {
            include_lighthouse: self.include_lighthouse.unwrap_or(true),
            include_crawl: self.include_crawl.unwrap_or(true),
            strategy: self.strategy.unwrap_or(default_strategy),
        }
    }
}

/// Audit pipelines plus persistence
#[derive(Clone)]
pub struct AuditService {
    store: AuditDb,
    enhanced: EnhancedAuditor,
    composite: CompositeAuditor,
    default_strategy: Strategy,
    enabled_adapters: Vec<&'static str>,
}

impl AuditService {
    pub fn new(store: AuditDb, adapters: Adapters, basic: BasicAuditor, strategy: Strategy) -> Self {
        Self {
            enabled_adapters: adapters.enabled(),
            enhanced: EnhancedAuditor::new(basic.clone(), &adapters),
            composite: CompositeAuditor::new(basic, adapters, strategy),
            store,
            default_strategy: strategy,
        }
    }

    /// Build adapters and auditors from config and open the store
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = AuditDb::connect(config).await?;
        let adapters = Adapters::from_config(config)?;
        let basic = BasicAuditor::new(&config.fetch)?;
        Ok(Self::new(store, adapters, basic, config.lighthouse.strategy))
    }

    pub fn store(&self) -> &AuditDb {
        &self.store
    }

    pub fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }

    /// Names of the external sources this service will call
    pub fn enabled_adapters(&self) -> &[&'static str] {
        &self.enabled_adapters
    }

    /// Run the enhanced audit without persisting anything
    pub async fn audit_url(&self, url: &str, options: &AuditOptions) -> AuditReport {
        self.enhanced.audit_website(url, options).await
    }

    /// Run the enhanced audit for a company and append the row
    pub async fn audit_company(&self, company_id: &str, request: &AuditRequest) -> Result<SeoAudit> {
        let company = self.store.require_company(company_id).await?;
        let url = request.url.as_deref().unwrap_or(&company.website);
        let report = self
            .enhanced
            .audit_website(url, &request.options(self.default_strategy))
            .await;

        let audit = self
            .store
            .insert_audit(&company.id, &report.to_new_audit())
            .await
            .inspect_err(|e| error!(company_id, error = %e, "Failed to store audit"))?;
        info!(company_id, audit_id = %audit.id, score = audit.audit.score, "Audit stored");
        Ok(audit)
    }

    /// Run the comprehensive audit for a company and append the row.
    /// Only an unknown company or a storage failure is an error.
    pub async fn comprehensive(&self, company_id: &str) -> Result<ComprehensiveResponse> {
        let started = Instant::now();
        let company = self.store.require_company(company_id).await?;
        let report = self.composite.run(&company).await;

        let duration = started.elapsed().as_secs_f64().round() as u64;
        let audit = self
            .store
            .insert_audit(&company.id, &report.to_new_audit(duration))
            .await
            .inspect_err(|e| error!(company_id, error = %e, "Failed to store comprehensive audit"))?;

        let duration = started.elapsed().as_secs_f64().round() as u64;
        info!(
            company_id,
            audit_id = %audit.id,
            overall_score = report.overall_score,
            duration_seconds = duration,
            "Comprehensive audit completed"
        );
        Ok(report.into_response(audit.id, duration))
    }
}
