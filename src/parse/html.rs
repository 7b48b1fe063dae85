//! HTML signal extraction

use super::{count_words, normalize_whitespace};
use crate::models::LinkGraph;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// On-page signals extracted from one HTML document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSignals {
    /// Trimmed `<title>` text, `None` when absent or empty
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_tags: Vec<String>,
    pub has_viewport: bool,
    pub image_count: usize,
    /// Images without an `alt` attribute at all
    pub images_missing_alt: usize,
    /// Resolved `img[src]` URLs
    pub image_sources: Vec<String>,
    pub canonical: Option<String>,
    /// Number of `script[type="application/ld+json"]` blocks
    pub structured_data_count: usize,
    /// `name`/`property` to `content` for every `<meta>` carrying both
    pub meta_tags: BTreeMap<String, String>,
    pub links: LinkGraph,
    pub word_count: usize,
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn element_text(elem: &ElementRef<'_>) -> String {
    normalize_whitespace(&elem.text().collect::<String>())
}

/// Parse an HTML document into page signals
pub fn parse_page(content: &str, base_url: &str) -> PageSignals {
    let document = Html::parse_document(content);
    let base = Url::parse(base_url).ok();
    let mut signals = PageSignals::default();

    signals.title = select_all(&document, "title")
        .first()
        .map(element_text)
        .filter(|t| !t.is_empty());

    for meta in select_all(&document, "meta") {
        let attrs = meta.value();
        let key = attrs.attr("name").or_else(|| attrs.attr("property"));
        let (Some(key), Some(value)) = (key, attrs.attr("content")) else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();

        if key == "description" && signals.meta_description.is_none() && !value.is_empty() {
            signals.meta_description = Some(value.clone());
        }
        if key == "viewport" && !value.is_empty() {
            signals.has_viewport = true;
        }
        signals.meta_tags.entry(key).or_insert(value);
    }

    signals.h1_tags = select_all(&document, "h1").iter().map(element_text).collect();

    for img in select_all(&document, "img") {
        signals.image_count += 1;
        if img.value().attr("alt").is_none() {
            signals.images_missing_alt += 1;
        }
        if let Some(src) = img.value().attr("src") {
            signals.image_sources.push(resolve(base.as_ref(), src));
        }
    }

    signals.canonical = select_all(&document, "link[rel]")
        .into_iter()
        .find(|l| {
            l.value()
                .attr("rel")
                .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")))
                .unwrap_or(false)
        })
        .and_then(|l| l.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());

    signals.structured_data_count = select_all(&document, "script[type]")
        .iter()
        .filter(|s| {
            s.value()
                .attr("type")
                .map(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
                .unwrap_or(false)
        })
        .count();

    signals.links = extract_links(&document, base.as_ref());
    signals.word_count = count_words(&visible_text(&document));

    signals
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

fn extract_links(document: &Html, base: Option<&Url>) -> LinkGraph {
    let mut links = LinkGraph::default();

    for anchor in select_all(document, "a[href]") {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }

        let url = resolve(base, href);
        if is_internal(&url, base) {
            links.internal.push(url);
        } else {
            links.external.push(url);
        }
    }

    links
}

/// Whether a resolved URL points at the same host as the base
pub fn is_internal(url: &str, base: Option<&Url>) -> bool {
    match (Url::parse(url), base) {
        (Ok(link), Some(base)) => {
            let strip = |h: &str| h.trim_start_matches("www.").to_lowercase();
            match (link.host_str(), base.host_str()) {
                (Some(a), Some(b)) => strip(a) == strip(b),
                _ => false,
            }
        }
        (Ok(_), None) => false,
        (Err(_), _) => !url.contains("://"),
    }
}

/// Text of the `<body>` with script, style and similar hidden elements removed
pub fn visible_text(document: &Html) -> String {
    let root = select_all(document, "body")
        .into_iter()
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| HIDDEN_ELEMENTS.contains(&e.name()))
                .unwrap_or(false)
        });
        if !hidden {
            parts.push(&**text);
        }
    }

    normalize_whitespace(&parts.join(" "))
}
