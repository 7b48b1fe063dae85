//! Audit storage using SQLite
//!
//! This module handles local persistence of:
//! - Companies (client sites that own audits)
//! - SEO audits (append-only, one row per run)

mod schema;

pub use schema::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{timestamp, Company, NewSeoAudit, SeoAudit};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Default page size for audit history
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Raw `seo_audits` row; JSON columns are stored as text
#[derive(Debug, Clone, FromRow)]
struct AuditRow {
    id: String,
    company_id: String,
    url: String,
    score: i64,
    title: String,
    meta_description: String,
    h1_tags: String,
    meta_tags: String,
    performance_score: i64,
    accessibility_score: i64,
    seo_score: i64,
    issues: String,
    extended_data: String,
    created_at: String,
}

fn score(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

impl TryFrom<AuditRow> for SeoAudit {
    type Error = Error;

    fn try_from(row: AuditRow) -> Result<Self> {
        Ok(SeoAudit {
            id: row.id,
            company_id: row.company_id,
            created_at: row.created_at,
            audit: NewSeoAudit {
                url: row.url,
                score: score(row.score),
                title: row.title,
                meta_description: row.meta_description,
                h1_tags: serde_json::from_str(&row.h1_tags)?,
                meta_tags: serde_json::from_str(&row.meta_tags)?,
                performance_score: score(row.performance_score),
                accessibility_score: score(row.accessibility_score),
                seo_score: score(row.seo_score),
                issues: serde_json::from_str(&row.issues)?,
                extended_data: serde_json::from_str(&row.extended_data)?,
            },
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub company_count: usize,
    pub audit_count: usize,
    pub latest_audit_at: Option<String>,
}

/// Audit database handle
#[derive(Clone)]
pub struct AuditDb {
    pool: SqlitePool,
}

impl AuditDb {
    /// Connect to the audit database configured in `paths.db_file`
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file).await
    }

    /// Connect to a database file, creating it and its schema if needed
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        if !db.is_initialized().await? {
            db.init_schema().await?;
        }
        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='seo_audits'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    // ===== Company Operations =====

    /// Insert a new company
    pub async fn insert_company(&self, company: &Company) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, website, industry, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.website)
        .bind(&company.industry)
        .bind(&company.created_at)
        .execute(&self.pool)
        .await?;
        info!(company_id = %company.id, website = %company.website, "Registered company");
        Ok(())
    }

    /// Get company by ID
    pub async fn get_company(&self, id: &str) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    /// Get company by ID, failing when it does not exist
    pub async fn require_company(&self, id: &str) -> Result<Company> {
        self.get_company(id)
            .await?
            .ok_or_else(|| Error::CompanyNotFound(id.to_string()))
    }

    /// List all companies, newest first
    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        let companies =
            sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(companies)
    }

    // ===== Audit Operations =====

    /// Append an audit row for a company
    pub async fn insert_audit(&self, company_id: &str, audit: &NewSeoAudit) -> Result<SeoAudit> {
        let row = SeoAudit {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            created_at: timestamp(),
            audit: audit.clone(),
        };

        sqlx::query(
            r#"
            INSERT INTO seo_audits (
                id, company_id, url, score, title, meta_description, h1_tags, meta_tags,
                performance_score, accessibility_score, seo_score, issues, extended_data, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.company_id)
        .bind(&audit.url)
        .bind(audit.score as i64)
        .bind(&audit.title)
        .bind(&audit.meta_description)
        .bind(serde_json::to_string(&audit.h1_tags)?)
        .bind(serde_json::to_string(&audit.meta_tags)?)
        .bind(audit.performance_score as i64)
        .bind(audit.accessibility_score as i64)
        .bind(audit.seo_score as i64)
        .bind(serde_json::to_string(&audit.issues)?)
        .bind(serde_json::to_string(&audit.extended_data)?)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;

        debug!(audit_id = %row.id, company_id, score = audit.score, "Stored audit");
        Ok(row)
    }

    /// Get audit by ID
    pub async fn get_audit(&self, id: &str) -> Result<Option<SeoAudit>> {
        let row = sqlx::query_as::<_, AuditRow>("SELECT * FROM seo_audits WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(SeoAudit::try_from).transpose()
    }

    /// List a company's audits, newest first
    pub async fn list_audits(&self, company_id: &str, limit: u32) -> Result<Vec<SeoAudit>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT * FROM seo_audits WHERE company_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(company_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SeoAudit::try_from).collect()
    }

    /// Count audits, optionally for one company
    pub async fn count_audits(&self, company_id: Option<&str>) -> Result<usize> {
        let count: i64 = match company_id {
            Some(id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM seo_audits WHERE company_id = ?")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM seo_audits")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count as usize)
    }

    /// Get global statistics
    pub async fn stats(&self) -> Result<StoreStats> {
        let company_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        let latest_audit_at: Option<String> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM seo_audits")
                .fetch_one(&self.pool)
                .await?;

        Ok(StoreStats {
            company_count: company_count as usize,
            audit_count: self.count_audits(None).await?,
            latest_audit_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditIssue, Impact, IssueType};
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    async fn setup_test_db() -> (AuditDb, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.db_file = tmp.path().join("test.db");

        let db = AuditDb::connect(&config).await.unwrap();
        (db, tmp)
    }

    fn sample_audit(score: u32) -> NewSeoAudit {
        let mut meta_tags = BTreeMap::new();
        meta_tags.insert("og:type".to_string(), "website".to_string());
        NewSeoAudit {
            url: "https://acme.example/".to_string(),
            score,
            title: "Acme".to_string(),
            meta_description: String::new(),
            h1_tags: vec!["Welcome".to_string()],
            meta_tags,
            performance_score: 85,
            accessibility_score: 95,
            seo_score: 70,
            issues: vec![AuditIssue::new(
                IssueType::Error,
                "meta",
                "Missing meta description",
                Impact::High,
            )],
            extended_data: json!({"word_count": 420}),
        }
    }

    #[tokio::test]
    async fn test_company_crud() {
        let (db, _tmp) = setup_test_db().await;

        let company = Company::new("Acme", "https://acme.example", Some("plumbing".into())).unwrap();
        db.insert_company(&company).await.unwrap();

        let loaded = db.get_company(&company.id).await.unwrap().unwrap();
        assert_eq!(loaded, company);
        assert_eq!(db.list_companies().await.unwrap().len(), 1);

        assert!(db.get_company("missing").await.unwrap().is_none());
        assert!(matches!(
            db.require_company("missing").await,
            Err(Error::CompanyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_audit_roundtrip_and_history_order() {
        let (db, _tmp) = setup_test_db().await;
        let company = Company::new("Acme", "https://acme.example", None).unwrap();
        db.insert_company(&company).await.unwrap();

        let first = db.insert_audit(&company.id, &sample_audit(61)).await.unwrap();
        let second = db.insert_audit(&company.id, &sample_audit(74)).await.unwrap();

        let loaded = db.get_audit(&first.id).await.unwrap().unwrap();
        assert_eq!(loaded, first);
        assert_eq!(loaded.audit.extended_data["word_count"], 420);

        let history = db.list_audits(&company.id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);

        assert_eq!(db.list_audits(&company.id, 1).await.unwrap().len(), 1);
        assert_eq!(db.count_audits(Some(&company.id)).await.unwrap(), 2);
        assert_eq!(db.count_audits(Some("other")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_audit_requires_known_company() {
        let (db, _tmp) = setup_test_db().await;
        let result = db.insert_audit("no-such-company", &sample_audit(50)).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_stats() {
        let (db, _tmp) = setup_test_db().await;
        let stats = db.stats().await.unwrap();
        assert_eq!(stats.company_count, 0);
        assert_eq!(stats.audit_count, 0);
        assert_eq!(stats.latest_audit_at, None);
    }
}
