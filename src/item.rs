//! Extracted item types
//!
//! This module defines the record produced by the extractor and the dense
//! sequential key the sink assigns when persisting it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One structured record extracted from a listing page
///
/// The `url` field carries the href exactly as it appeared in the document;
/// crawl-scope URL normalization never touches stored items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Entry title text (never empty)
    pub title: String,
    /// Entry link as found in the document
    pub url: String,
}

impl Item {
    /// Creates a new item
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Key under which an item is persisted, rendered as `item-<n>`
///
/// Keys are assigned by the sink in a dense, gapless sequence starting at 0,
/// so a consumer holding the total count can read every record back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(u64);

impl ItemKey {
    /// Creates a key for the given sequence index
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    /// Returns the sequence index behind this key
    pub fn index(&self) -> u64 {
        self.0
    }

    /// Parses a key from its stored form
    ///
    /// # Returns
    ///
    /// * `Some(key)` - Input had the `item-<n>` shape
    /// * `None` - Anything else
    pub fn parse(s: &str) -> Option<Self> {
        let index = s.strip_prefix("item-")?.parse().ok()?;
        Some(Self(index))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}
