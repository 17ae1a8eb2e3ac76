//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier (FIFO queue plus visited set)
//! - HTTP fetching with bounded retry
//! - Link discovery and follow rules
//! - Item extraction from listing markup
//! - Per-host politeness limits and the robots.txt gate
//! - Overall run orchestration

mod engine;
mod extractor;
mod fetcher;
mod frontier;
mod parser;
mod politeness;
mod robots;
mod rules;

pub use engine::{CrawlEngine, CrawlReport, FinishReason};
pub use extractor::{Extractor, ListingExtractor};
pub use fetcher::{build_http_client, FetchError, Fetcher, Page};
pub use frontier::{CrawlTask, Frontier};
pub use parser::discover_links;
pub use politeness::{HostLimiter, HostPermit};
pub use robots::RobotsGate;
pub use rules::LinkRules;
