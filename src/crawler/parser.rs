//! Link discovery on fetched pages
//!
//! This module handles:
//! - Finding `<a href>` anchors in fetched HTML
//! - Resolving hrefs against the page URL into absolute URLs
//! - Dropping non-navigable hrefs (scripts, mail, phone, data URIs,
//!   same-page fragments)
//!
//! Discovery is deliberately permissive: everything navigable comes out in
//! document order, duplicates included. Deciding what the crawl may follow
//! is the rule engine's job.

use scraper::{Html, Selector};
use url::Url;

/// Collects every navigable link on a page as an absolute URL
///
/// # Arguments
///
/// * `html` - The fetched HTML content
/// * `page_url` - The URL the content was fetched from, used to resolve
///   relative hrefs
///
/// # Returns
///
/// Absolute `http`/`https` URLs in document order. Duplicates are preserved.
///
/// # Example
///
/// ```
/// use newsreel::crawler::discover_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="news?p=2">More</a></body></html>"#;
/// let page_url = Url::parse("https://news.ycombinator.com/news?p=1").unwrap();
/// let links = discover_links(html, &page_url);
/// assert_eq!(links[0].as_str(), "https://news.ycombinator.com/news?p=2");
/// ```
pub fn discover_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(anchor_selector) = Selector::parse("a[href]") {
        for element in document.select(&anchor_selector) {
            // Links marked as file downloads are not pages
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_href(href, page_url) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Resolves one href to an absolute URL, or drops it
///
/// Returns `None` for hrefs that do not lead to a fetchable page:
/// - `javascript:`, `mailto:`, `tel:`, `data:` schemes
/// - Same-page fragment anchors (`#comments`)
/// - Hrefs that fail to resolve against the page URL
/// - Anything that resolves to a non-HTTP(S) scheme
fn resolve_href(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match page_url.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}
