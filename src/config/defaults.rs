//! Default values for configuration

/// Browser-like user agent; many sites refuse obvious bot agents outright
pub fn default_fetch_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

/// Default page fetch timeout in seconds
pub fn default_fetch_timeout() -> u64 {
    15
}

/// Default maximum redirects followed when fetching a page
pub fn default_fetch_max_redirects() -> usize {
    5
}

/// API key environment variables for PageSpeed, in priority order
pub fn default_lighthouse_api_key_envs() -> Vec<String> {
    vec![
        "GOOGLE_SPEED_KEY".to_string(),
        "GOOGLE_PAGESPEED_API_KEY".to_string(),
        "GOOGLE_API_KEY".to_string(),
    ]
}

/// Default PageSpeed Insights endpoint
pub fn default_lighthouse_endpoint() -> String {
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string()
}

/// PageSpeed runs a full Lighthouse pass, so it gets the longest timeout
pub fn default_lighthouse_timeout() -> u64 {
    30
}

/// Default Firecrawl API key environment variable
pub fn default_crawl_api_key_env() -> String {
    "FIRECRAWL_API_KEY".to_string()
}

/// Default Firecrawl API base URL
pub fn default_crawl_endpoint() -> String {
    "https://api.firecrawl.dev".to_string()
}

/// Default crawl timeout in seconds
pub fn default_crawl_timeout() -> u64 {
    30
}

/// Default OpenPageRank API key environment variable
pub fn default_backlinks_api_key_env() -> String {
    "OPENPAGERANK_API_KEY".to_string()
}

/// Default OpenPageRank endpoint
pub fn default_openpagerank_endpoint() -> String {
    "https://openpagerank.com/api/v1.0/getPageRank".to_string()
}

/// Default Common Crawl index server
pub fn default_commoncrawl_endpoint() -> String {
    "https://index.commoncrawl.org".to_string()
}

/// Default Common Crawl collection queried for captures
pub fn default_commoncrawl_collection() -> String {
    "CC-MAIN-2025-10-index".to_string()
}

/// Maximum Common Crawl records fetched per lookup
pub fn default_commoncrawl_limit() -> usize {
    1000
}

/// Default backlink lookup timeout in seconds
pub fn default_backlinks_timeout() -> u64 {
    30
}

/// Default SerpAPI key environment variable
pub fn default_serp_api_key_env() -> String {
    "SERP_API_KEY".to_string()
}

/// Default SerpAPI endpoint
pub fn default_serp_endpoint() -> String {
    "https://serpapi.com/search".to_string()
}

/// Default SERP country
pub fn default_serp_country() -> String {
    "au".to_string()
}

/// Default SERP interface language
pub fn default_serp_language() -> String {
    "en".to_string()
}

/// Number of organic results analyzed
pub fn default_serp_results() -> usize {
    10
}

/// Default SERP timeout in seconds
pub fn default_serp_timeout() -> u64 {
    15
}

/// Default AI API key environment variable
pub fn default_ai_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

/// Default Anthropic Messages endpoint
pub fn default_ai_endpoint() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

/// Default model used for summaries and keyword work
pub fn default_ai_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

/// Default token budget per AI request
pub fn default_ai_max_tokens() -> u32 {
    2000
}

/// Default AI request timeout in seconds
pub fn default_ai_timeout() -> u64 {
    30
}

/// Default HTTP bind address
pub fn default_server_bind() -> String {
    std::env::var("SITESCORE_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string())
}
