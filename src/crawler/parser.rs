//! HTML parser for extracting links and visible text
//!
//! Parsing never fails: malformed markup yields whatever html5ever
//! recovers, which may be no links and no text.

use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// All links found on the page (absolute URLs)
    pub links: Vec<String>,

    /// Visible text with whitespace collapsed to single spaces
    pub text: String,
}

/// Parses HTML content and extracts links and visible text
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links
///
/// # Example
///
/// ```
/// use sumi_sweep::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><p>Hi</p><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://www.ics.uci.edu/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.links, vec!["https://www.ics.uci.edu/page".to_string()]);
/// assert_eq!(parsed.text, "Test Hi Link");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        links: extract_links(&document, base_url),
        text: extract_visible_text(&document),
    }
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Collects text nodes outside hidden elements, whitespace-collapsed
fn extract_visible_text(document: &Html) -> String {
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let text = match node.value() {
            Node::Text(text) => text,
            _ => continue,
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes and data: URIs
/// - Fragment-only or empty hrefs
/// - Invalid URLs or non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
