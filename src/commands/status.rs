//! Status command implementation

use crate::audit::AuditService;
use crate::config::Config;
use crate::error::Result;
use crate::store::StoreStats;
use serde::{Deserialize, Serialize};
use tracing::info;

const ADAPTERS: [&str; 5] = ["lighthouse", "crawl", "backlinks", "serp", "ai"];

/// Whether an external source is configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterStatus {
    pub name: String,
    pub enabled: bool,
}

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub bind: String,
    pub strategy: String,
    pub adapters: Vec<AdapterStatus>,
    pub db_stats: StoreStats,
}

/// Get system status
pub async fn cmd_status(config: &Config, service: &AuditService) -> Result<StatusInfo> {
    info!("Getting status");

    let db_stats = service.store().stats().await?;
    let enabled = service.enabled_adapters();

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        bind: config.server.bind.clone(),
        strategy: config.lighthouse.strategy.to_string(),
        adapters: ADAPTERS
            .iter()
            .map(|name| AdapterStatus {
                name: name.to_string(),
                enabled: enabled.contains(name),
            })
            .collect(),
        db_stats,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 sitescore Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("HTTP bind: {}", status.bind);
    println!("PageSpeed strategy: {}", status.strategy);

    println!("\nData sources:");
    for adapter in &status.adapters {
        let state = if adapter.enabled {
            "✓ Enabled"
        } else {
            "✗ Not configured (API key missing)"
        };
        println!("  {:<11} {}", adapter.name, state);
    }

    println!("\nDatabase Stats:");
    println!("  Companies: {}", status.db_stats.company_count);
    println!("  Audits: {}", status.db_stats.audit_count);
    if let Some(latest) = &status.db_stats.latest_audit_at {
        println!("  Latest audit: {}", latest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Adapters;
    use crate::audit::BasicAuditor;
    use crate::models::Strategy;
    use crate::store::AuditDb;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_without_adapters() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        let db = AuditDb::connect(&config).await.unwrap();
        let basic = BasicAuditor::new(&config.fetch).unwrap();
        let service = AuditService::new(db, Adapters::default(), basic, Strategy::Mobile);

        let status = cmd_status(&config, &service).await.unwrap();
        assert_eq!(status.adapters.len(), 5);
        assert!(status.adapters.iter().all(|a| !a.enabled));
        assert_eq!(status.db_stats.company_count, 0);
        assert_eq!(status.db_stats.audit_count, 0);
        assert!(status.db_path.ends_with("sitescore.db"));
    }
}
