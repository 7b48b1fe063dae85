//! Configuration management for sitescore
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! API keys are never stored in the file; each adapter section names the
//! environment variable(s) its key is read from.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::models::Strategy;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page fetching for the basic auditor
    #[serde(default)]
    pub fetch: FetchConfig,

    /// PageSpeed Insights (Lighthouse) adapter
    #[serde(default)]
    pub lighthouse: LighthouseConfig,

    /// Firecrawl content extraction adapter
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Backlink analysis (OpenPageRank + Common Crawl)
    #[serde(default)]
    pub backlinks: BacklinkConfig,

    /// SERP analysis (SerpAPI)
    #[serde(default)]
    pub serp: SerpConfig,

    /// AI text generation for keywords and executive summaries
    #[serde(default)]
    pub ai: AiConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Page fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent string
    #[serde(default = "default_fetch_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Maximum redirects to follow
    #[serde(default = "default_fetch_max_redirects")]
    pub max_redirects: usize,
}

/// PageSpeed Insights configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LighthouseConfig {
    /// Environment variables checked for the API key, first match wins
    #[serde(default = "default_lighthouse_api_key_envs")]
    pub api_key_envs: Vec<String>,

    #[serde(default = "default_lighthouse_endpoint")]
    pub endpoint: String,

    /// Default device strategy
    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default = "default_lighthouse_timeout")]
    pub timeout_secs: u64,
}

/// Firecrawl configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    #[serde(default = "default_crawl_api_key_env")]
    pub api_key_env: String,

    /// API base URL (the `/v1/scrape` path is appended)
    #[serde(default = "default_crawl_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_crawl_timeout")]
    pub timeout_secs: u64,
}

/// Backlink analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklinkConfig {
    /// OpenPageRank key; domain ratings fall back to a heuristic without it
    #[serde(default = "default_backlinks_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openpagerank_endpoint")]
    pub openpagerank_endpoint: String,

    #[serde(default = "default_commoncrawl_endpoint")]
    pub commoncrawl_endpoint: String,

    #[serde(default = "default_commoncrawl_collection")]
    pub commoncrawl_collection: String,

    #[serde(default = "default_commoncrawl_limit")]
    pub commoncrawl_limit: usize,

    #[serde(default = "default_backlinks_timeout")]
    pub timeout_secs: u64,
}

/// SERP analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpConfig {
    #[serde(default = "default_serp_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_serp_endpoint")]
    pub endpoint: String,

    /// Google country code (`gl`)
    #[serde(default = "default_serp_country")]
    pub country: String,

    /// Google interface language (`hl`)
    #[serde(default = "default_serp_language")]
    pub language: String,

    /// Organic results analyzed (1-100)
    #[serde(default = "default_serp_results")]
    pub num_results: usize,

    #[serde(default = "default_serp_timeout")]
    pub timeout_secs: u64,
}

/// AI text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    #[serde(default = "default_ai_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for sitescore data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_fetch_user_agent(),
            timeout_secs: default_fetch_timeout(),
            max_redirects: default_fetch_max_redirects(),
        }
    }
}

impl Default for LighthouseConfig {
    fn default() -> Self {
        Self {
            api_key_envs: default_lighthouse_api_key_envs(),
            endpoint: default_lighthouse_endpoint(),
            strategy: Strategy::default(),
            timeout_secs: default_lighthouse_timeout(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_crawl_api_key_env(),
            endpoint: default_crawl_endpoint(),
            timeout_secs: default_crawl_timeout(),
        }
    }
}

impl Default for BacklinkConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_backlinks_api_key_env(),
            openpagerank_endpoint: default_openpagerank_endpoint(),
            commoncrawl_endpoint: default_commoncrawl_endpoint(),
            commoncrawl_collection: default_commoncrawl_collection(),
            commoncrawl_limit: default_commoncrawl_limit(),
            timeout_secs: default_backlinks_timeout(),
        }
    }
}

impl Default for SerpConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_serp_api_key_env(),
            endpoint: default_serp_endpoint(),
            country: default_serp_country(),
            language: default_serp_language(),
            num_results: default_serp_results(),
            timeout_secs: default_serp_timeout(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_ai_api_key_env(),
            endpoint: default_ai_endpoint(),
            model: default_ai_model(),
            max_tokens: default_ai_max_tokens(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
        }
    }
}

/// Read a non-empty environment variable
pub fn env_key(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Get the default base directory for sitescore (~/.sitescore)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sitescore")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("sitescore.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("sitescore.db"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// PageSpeed API key from the first populated environment variable
    pub fn lighthouse_api_key(&self) -> Option<String> {
        self.lighthouse.api_key_envs.iter().find_map(|name| env_key(name))
    }

    pub fn crawl_api_key(&self) -> Option<String> {
        env_key(&self.crawl.api_key_env)
    }

    pub fn backlinks_api_key(&self) -> Option<String> {
        env_key(&self.backlinks.api_key_env)
    }

    pub fn serp_api_key(&self) -> Option<String> {
        env_key(&self.serp.api_key_env)
    }

    pub fn ai_api_key(&self) -> Option<String> {
        env_key(&self.ai.api_key_env)
    }

    /// Parsed server bind address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| Error::Config(format!("server.bind '{}': {}", self.server.bind, e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(Error::Config("fetch.user_agent must not be empty".to_string()));
        }

        let timeouts = [
            ("fetch.timeout_secs", self.fetch.timeout_secs),
            ("lighthouse.timeout_secs", self.lighthouse.timeout_secs),
            ("crawl.timeout_secs", self.crawl.timeout_secs),
            ("backlinks.timeout_secs", self.backlinks.timeout_secs),
            ("serp.timeout_secs", self.serp.timeout_secs),
            ("ai.timeout_secs", self.ai.timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(Error::Config(format!("{} must be positive", name)));
        }

        if self.serp.num_results == 0 || self.serp.num_results > 100 {
            return Err(Error::Config(
                "serp.num_results must be between 1 and 100".to_string(),
            ));
        }

        if self.backlinks.commoncrawl_limit == 0 {
            return Err(Error::Config(
                "backlinks.commoncrawl_limit must be positive".to_string(),
            ));
        }

        self.bind_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch.timeout_secs, 15);
        assert_eq!(config.fetch.max_redirects, 5);
        assert_eq!(config.lighthouse.strategy, Strategy::Mobile);
        assert_eq!(config.lighthouse.api_key_envs[0], "GOOGLE_SPEED_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.serp.country = "us".to_string();

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.serp.country, "us");
        assert_eq!(loaded.paths.db_file, tmp.path().join("sitescore.db"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [lighthouse]
            strategy = "desktop"
            "#,
        )
        .unwrap();
        assert_eq!(config.lighthouse.strategy, Strategy::Desktop);
        assert_eq!(config.crawl.api_key_env, "FIRECRAWL_API_KEY");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.fetch.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.fetch.timeout_secs = 15;

        config.serp.num_results = 0;
        assert!(config.validate().is_err());
        config.serp.num_results = 10;

        config.server.bind = "not an address".to_string();
        assert!(config.validate().is_err());
        config.server.bind = "0.0.0.0:9000".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_env_name_resolves_to_none() {
        assert_eq!(env_key(""), None);
    }
}
