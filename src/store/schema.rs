//! SQLite schema definition

/// SQL schema for the audit database
pub const SCHEMA_SQL: &str = r#"
-- Companies: registered client sites that own audits
CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    website TEXT NOT NULL,
    industry TEXT,
    created_at TEXT NOT NULL
);

-- SEO audits: one row appended per run, never updated
CREATE TABLE IF NOT EXISTS seo_audits (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id),
    url TEXT NOT NULL,
    score INTEGER NOT NULL,
    title TEXT NOT NULL,
    meta_description TEXT NOT NULL,
    h1_tags TEXT NOT NULL,
    meta_tags TEXT NOT NULL,
    performance_score INTEGER NOT NULL,
    accessibility_score INTEGER NOT NULL,
    seo_score INTEGER NOT NULL,
    issues TEXT NOT NULL,
    extended_data TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_seo_audits_company ON seo_audits(company_id, created_at);
"#;
