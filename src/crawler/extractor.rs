//! Item extraction from listing pages
//!
//! This module handles:
//! - Selecting listing entries with a configured CSS selector
//! - Pulling the title and href out of each entry's link element
//! - Skipping malformed entries without failing the page
//!
//! Extraction is structural only: the href is captured verbatim, with no
//! resolution or normalization. Items are records for a downstream consumer,
//! not crawl candidates.

use crate::config::ExtractConfig;
use crate::item::Item;
use crate::{ConfigError, ConfigResult};
use scraper::{Html, Selector};

// ===== Extraction =====

/// Turns fetched HTML into structured items
///
/// Implementations must be pure with respect to the input: the same HTML
/// always yields the same items in the same order.
pub trait Extractor: Send + Sync {
    /// Extracts every well-formed item from a page, in document order
    fn extract(&self, html: &str) -> Vec<Item>;
}

/// Extractor for listing markup in the Hacker News shape
///
/// An entry selector locates each listing row's title cell, and a link
/// selector locates the anchor inside it. The first matching anchor wins,
/// so trailing site-attribution anchors inside the same cell are ignored.
#[derive(Debug)]
pub struct ListingExtractor {
    entry_selector: Selector,
    link_selector: Selector,
}

impl ListingExtractor {
    /// Compiles the configured selectors
    ///
    /// # Arguments
    ///
    /// * `config` - The `[extract]` section of the crawl config
    ///
    /// # Returns
    ///
    /// * `Ok(ListingExtractor)` - Both selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector failed to compile
    pub fn from_config(config: &ExtractConfig) -> ConfigResult<Self> {
        let entry_selector = Selector::parse(&config.entry_selector)
            .map_err(|e| ConfigError::InvalidSelector(format!("{}: {}", config.entry_selector, e)))?;
        let link_selector = Selector::parse(&config.link_selector)
            .map_err(|e| ConfigError::InvalidSelector(format!("{}: {}", config.link_selector, e)))?;

        Ok(Self {
            entry_selector,
            link_selector,
        })
    }
}

impl Extractor for ListingExtractor {
    /// Extracts one item per well-formed entry
    ///
    /// An entry contributes an item only when it contains a link element
    /// with a non-empty `href` and non-empty trimmed text. Anything else is
    /// skipped without affecting neighboring entries.
    fn extract(&self, html: &str) -> Vec<Item> {
        let document = Html::parse_document(html);
        let mut items = Vec::new();

        for entry in document.select(&self.entry_selector) {
            let link = match entry.select(&self.link_selector).next() {
                Some(link) => link,
                None => continue,
            };

            let href = match link.value().attr("href") {
                Some(href) if !href.trim().is_empty() => href.trim(),
                _ => continue,
            };

            let title = link.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                continue;
            }

            items.push(Item::new(title, href));
        }

        items
    }
}
