//! Robots.txt gate
//!
//! This module handles:
//! - Fetching each host's robots.txt once per run and caching the verdict
//! - Checking fetch candidates against the cached rules
//! - Failing open when robots.txt cannot be retrieved
//!
//! The cache lives for the duration of one crawl run, so there is no
//! staleness handling. The gate can be disabled wholesale from config for
//! crawls against hosts the operator controls.

use crate::url::extract_host;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// One host's robots verdict source
#[derive(Debug)]
struct HostRules {
    /// Fetched robots.txt body; `None` means the fetch failed and the host
    /// is treated as allowing everything
    content: Option<String>,
}

impl HostRules {
    fn allows(&self, url: &Url, user_agent: &str) -> bool {
        match &self.content {
            None => true,
            Some(content) if content.is_empty() => true,
            Some(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url.as_str())
            }
        }
    }
}

/// Per-run robots.txt checks for fetch candidates
pub struct RobotsGate {
    client: Client,
    user_agent: String,
    enabled: bool,
    cache: Mutex<HashMap<String, Arc<HostRules>>>,
}

impl RobotsGate {
    /// Creates the gate
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt retrieval
    /// * `user_agent` - Agent string robots rules are evaluated against
    /// * `enabled` - When false, every check passes without any fetch
    pub fn new(client: Client, user_agent: String, enabled: bool) -> Self {
        Self {
            client,
            user_agent,
            enabled,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether robots rules permit fetching `url`
    ///
    /// The first check against a host fetches its robots.txt; later checks
    /// hit the cache. The cache lock is held across the fetch so each host
    /// is asked exactly once per run, even with concurrent workers.
    ///
    /// # Returns
    ///
    /// * `true` - Allowed, robots unavailable, or the gate is disabled
    /// * `false` - The host's robots.txt disallows this URL
    pub async fn is_allowed(&self, url: &Url) -> bool {
        if !self.enabled {
            return true;
        }

        let host = match extract_host(url) {
            Some(host) => host,
            None => return true,
        };
        let origin = format!("{}://{}", url.scheme(), authority(url, &host));

        let rules = {
            let mut cache = self.cache.lock().await;
            match cache.get(&origin) {
                Some(rules) => Arc::clone(rules),
                None => {
                    let fetched = Arc::new(HostRules {
                        content: self.fetch_robots(url).await,
                    });
                    cache.insert(origin, Arc::clone(&fetched));
                    fetched
                }
            }
        };

        rules.allows(url, &self.user_agent)
    }

    /// Retrieves a host's robots.txt body, or `None` when unavailable
    async fn fetch_robots(&self, url: &Url) -> Option<String> {
        let mut robots_url = url.clone();
        robots_url.set_path("/robots.txt");
        robots_url.set_query(None);
        robots_url.set_fragment(None);

        match self.client.get(robots_url.clone()).send().await {
            Ok(response) if response.status().is_success() => response.text().await.ok(),
            Ok(response) => {
                tracing::debug!(
                    "No robots.txt at {} (HTTP {}), allowing host",
                    robots_url,
                    response.status().as_u16()
                );
                None
            }
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}, allowing host", robots_url, e);
                None
            }
        }
    }
}

fn authority(url: &Url, host: &str) -> String {
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
