//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::AuditDb;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub force: bool,
}

/// Where init put things
#[derive(Debug, Clone, Serialize)]
pub struct InitSummary {
    pub config_path: String,
    pub db_path: String,
    pub overwritten: bool,
}

/// Write a default config and create the audit database.
///
/// An existing config is only replaced with `force`; the database is never
/// wiped, so re-running init keeps stored audits.
pub async fn cmd_init(options: InitOptions) -> Result<InitSummary> {
    let mut config = Config::default();
    config.init_paths(Some(options.base_dir));

    let exists = config.paths.config_file.exists();
    if exists && !options.force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    config.save()?;
    AuditDb::connect(&config).await?;
    info!(db = ?config.paths.db_file, "Audit database ready");

    Ok(InitSummary {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        overwritten: exists,
    })
}

pub fn print_init(summary: &InitSummary) {
    println!("✓ sitescore initialized successfully");
    println!("  Config: {}", summary.config_path);
    println!("  Database: {}", summary.db_path);
    println!("\nNext steps:");
    println!("  1. Export API keys for the sources you want (GOOGLE_SPEED_KEY, FIRECRAWL_API_KEY,");
    println!("     OPENPAGERANK_API_KEY, SERP_API_KEY, ANTHROPIC_API_KEY)");
    println!("  2. Register a site: sitescore company add \"Acme\" https://acme.example");
    println!("  3. Audit it: sitescore comprehensive <company-id>");
}
