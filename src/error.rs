//! Custom error types for sitescore

use std::fmt;
use thiserror::Error;

/// Main error type for sitescore operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchFailure),

    #[error("{adapter} adapter error: {cause}")]
    Adapter {
        adapter: &'static str,
        cause: AdapterFailure,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Audit not found: {0}")]
    AuditNotFound(String),

    #[error("Not initialized: run 'sitescore init' first")]
    NotInitialized,

    #[error("MCP protocol error: {0}")]
    McpProtocol(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Result type alias for sitescore
pub type Result<T> = std::result::Result<T, Error>;

/// Why the audited site itself could not be fetched.
///
/// These never escape the basic auditor; they are folded into a zero-score
/// result carrying a single connectivity issue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("Website is blocking automated requests (403 Forbidden)")]
    Blocked,

    #[error("Authentication required (401 Unauthorized)")]
    AuthRequired,

    #[error("Page not found (404)")]
    NotFound,

    #[error("Connection timeout - website may be offline")]
    Offline,

    #[error("Unable to access website (HTTP {0})")]
    HttpStatus(u16),

    #[error("Unable to access website: {0}")]
    Other(String),
}

impl FetchFailure {
    /// Map a non-success HTTP status to a failure
    pub fn from_status(status: u16) -> Self {
        match status {
            403 => FetchFailure::Blocked,
            401 => FetchFailure::AuthRequired,
            404 => FetchFailure::NotFound,
            other => FetchFailure::HttpStatus(other),
        }
    }

    /// Map a transport-level reqwest error to a failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16());
        }
        if err.is_timeout() || err.is_connect() {
            return FetchFailure::Offline;
        }
        FetchFailure::Other(err.to_string())
    }

    /// Remediation hints shown alongside the connectivity issue
    pub fn remediation(&self) -> Vec<String> {
        let hints: &[&str] = match self {
            FetchFailure::Blocked => &[
                "The site has security measures (WAF/bot protection) preventing automated audits",
                "Try using Google PageSpeed Insights: https://pagespeed.web.dev/",
                "Or perform a manual SEO review using browser developer tools",
            ],
            FetchFailure::AuthRequired => &["This site requires login credentials to view"],
            FetchFailure::Offline => &[
                "Verify the website URL is correct",
                "Check if the website is currently accessible",
            ],
            FetchFailure::NotFound => &["Double-check the URL for typos", "Ensure the page exists"],
            FetchFailure::HttpStatus(_) | FetchFailure::Other(_) => {
                &["Check website accessibility", "Try again later"]
            }
        };
        hints.iter().map(|h| h.to_string()).collect()
    }
}

/// Why an external analyzer call failed. Logged, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterFailure {
    RateLimited,
    Unauthorized(u16),
    Network(String),
    Upstream(u16),
    Decode(String),
    NotConfigured,
}

impl fmt::Display for AdapterFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterFailure::RateLimited => write!(f, "rate limit exceeded (429)"),
            AdapterFailure::Unauthorized(code) => write!(f, "authentication failed ({})", code),
            AdapterFailure::Network(msg) => write!(f, "network error: {}", msg),
            AdapterFailure::Upstream(code) => write!(f, "upstream returned HTTP {}", code),
            AdapterFailure::Decode(msg) => write!(f, "unexpected response: {}", msg),
            AdapterFailure::NotConfigured => write!(f, "not configured"),
        }
    }
}

impl std::error::Error for AdapterFailure {}

impl AdapterFailure {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => AdapterFailure::RateLimited,
            400 | 401 | 403 => AdapterFailure::Unauthorized(status),
            other => AdapterFailure::Upstream(other),
        }
    }
}

impl From<reqwest::Error> for AdapterFailure {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16());
        }
        if err.is_decode() {
            return AdapterFailure::Decode(err.to_string());
        }
        AdapterFailure::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterFailure {
    fn from(err: serde_json::Error) -> Self {
        AdapterFailure::Decode(err.to_string())
    }
}
