//! HTML parsing for on-page SEO signals
//!
//! This module handles:
//! - Head metadata (title, meta description, viewport, canonical, meta tags)
//! - Body structure (H1 headings, images, structured data blocks)
//! - Link classification into internal and external
//! - Visible word counting

mod html;

pub use html::*;

use unicode_segmentation::UnicodeSegmentation;

/// Count words in already-extracted text
pub fn count_words(text: &str) -> usize {
    text.unicode_words().count()
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Host of a URL without a leading `www.`
pub fn bare_host(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}
