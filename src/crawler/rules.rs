//! Link rule engine: decides which discovered links the crawl may follow
//!
//! This module handles:
//! - Host allow-list checks against normalized candidate links
//! - Allow-pattern (regex) matching against the full normalized URL
//! - Order-preserving deduplication within one page's link set
//!
//! Filtering is pure: the same candidate set against the same rules always
//! yields the same result, independent of crawl history. History (the visited
//! set) lives in the frontier, not here.

use crate::config::RulesConfig;
use crate::url::{extract_host, normalize_url};
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Compiled follow rules, built once at startup from the rules config
#[derive(Debug)]
pub struct LinkRules {
    /// Exact hostnames the crawl may touch, lowercased
    allowed_hosts: HashSet<String>,

    /// Compiled allow-patterns; empty means every URL on an allowed host passes
    patterns: Vec<Regex>,
}

impl LinkRules {
    /// Compiles the rule set from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The `[rules]` section of the crawl config
    ///
    /// # Returns
    ///
    /// * `Ok(LinkRules)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - A pattern failed to compile
    pub fn from_config(config: &RulesConfig) -> ConfigResult<Self> {
        let allowed_hosts = config
            .allowed_hosts
            .iter()
            .map(|host| host.to_lowercase())
            .collect();

        let mut patterns = Vec::with_capacity(config.follow_patterns.len());
        for pattern in &config.follow_patterns {
            let compiled = Regex::new(pattern)
                .map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", pattern, e)))?;
            patterns.push(compiled);
        }

        Ok(Self {
            allowed_hosts,
            patterns,
        })
    }

    /// Checks a single normalized URL against host list and patterns
    ///
    /// # Returns
    ///
    /// * `true` - Host is allowed and at least one pattern matches (or no
    ///   patterns are configured)
    /// * `false` - Otherwise
    pub fn is_followable(&self, url: &Url) -> bool {
        let host = match extract_host(url) {
            Some(host) => host,
            None => return false,
        };

        if !self.allowed_hosts.contains(&host) {
            return false;
        }

        if self.patterns.is_empty() {
            return true;
        }

        self.patterns.iter().any(|p| p.is_match(url.as_str()))
    }

    /// Filters one page's discovered links down to followable candidates
    ///
    /// Each candidate is normalized, checked against the host allow-list and
    /// the allow-patterns, and deduplicated. Candidates that fail to
    /// normalize are dropped silently. Output order follows input order of
    /// first occurrence.
    ///
    /// # Arguments
    ///
    /// * `candidates` - Absolute URLs discovered on a page, in document order
    ///
    /// # Returns
    ///
    /// The followable subset, normalized and deduplicated
    pub fn filter_follow_links(&self, candidates: &[Url]) -> Vec<Url> {
        let mut seen = HashSet::new();
        let mut followable = Vec::new();

        for candidate in candidates {
            let normalized = match normalize_url(candidate.as_str()) {
                Ok(url) => url,
                Err(_) => continue,
            };

            if !self.is_followable(&normalized) {
                continue;
            }

            if seen.insert(normalized.as_str().to_string()) {
                followable.push(normalized);
            }
        }

        followable
    }
}
