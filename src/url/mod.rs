//! URL handling module
//!
//! This module provides the URL normalization that defines frontier dedup
//! identity, plus host extraction for politeness and scope checks.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::extract_host;
pub use normalize::normalize_url;
