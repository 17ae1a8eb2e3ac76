//! HTTP fetcher implementation
//!
//! This module handles all page retrieval for the crawler, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - GET requests with per-request timeout
//! - Bounded retry with exponential backoff for transient failures
//! - Error classification (transient vs terminal)
//! - Cancellation between and during attempts

use crate::config::FetchConfig;
use chrono::{DateTime, Utc};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub url: Url,

    /// Response body
    pub html: String,

    /// When the response arrived
    pub fetched_at: DateTime<Utc>,
}

/// Errors a fetch can end in
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transient failures exhausted the retry budget
    #[error("Fetch of {url} failed after {attempts} attempts: {reason}")]
    Failed {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// The server rejected the request; retrying cannot help
    #[error("Fetch of {url} rejected: {reason}")]
    Terminal { url: String, reason: String },

    /// The crawl was cancelled while this fetch was pending
    #[error("Fetch of {url} cancelled")]
    Cancelled { url: String },
}

/// How a single attempt failed
enum AttemptError {
    /// Deterministic rejection, not worth another try
    Terminal(String),

    /// Might succeed on a later attempt
    Transient(String),
}

/// Builds the HTTP client shared by all fetch workers
///
/// # Arguments
///
/// * `config` - The `[fetch]` section of the crawl config
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves pages with bounded retry
///
/// One fetcher is shared by all workers; the underlying client pools
/// connections across them.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl Fetcher {
    /// Creates a fetcher around an already-built client
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Fetches one URL, retrying transient failures
    ///
    /// # Attempt Classification
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Success |
    /// | 4xx | Terminal, no retry |
    /// | 5xx | Retry with backoff |
    /// | Timeout / connection failure | Retry with backoff |
    /// | Redirect chain too long | Terminal |
    ///
    /// The retry budget is `max_retries` beyond the first attempt, with the
    /// backoff doubling between attempts. Cancellation is observed before
    /// each attempt, during the request, and during backoff sleeps.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `cancel` - Crawl-wide cancellation token
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - The fetched page, with the post-redirect URL
    /// * `Err(FetchError)` - Exhausted, terminal, or cancelled
    pub async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<Page, FetchError> {
        let attempts = self.max_retries + 1;
        let mut last_reason = String::new();

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled {
                    url: url.to_string(),
                });
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(FetchError::Cancelled { url: url.to_string() });
                }
                outcome = self.attempt(url) => outcome,
            };

            match outcome {
                Ok(page) => return Ok(page),
                Err(AttemptError::Terminal(reason)) => {
                    return Err(FetchError::Terminal {
                        url: url.to_string(),
                        reason,
                    });
                }
                Err(AttemptError::Transient(reason)) => {
                    tracing::debug!(
                        "Fetch attempt {}/{} for {} failed: {}",
                        attempt,
                        attempts,
                        url,
                        reason
                    );
                    last_reason = reason;

                    if attempt < attempts {
                        let delay = self.backoff * 2u32.pow(attempt - 1);
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                return Err(FetchError::Cancelled { url: url.to_string() });
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }

        Err(FetchError::Failed {
            url: url.to_string(),
            attempts,
            reason: last_reason,
        })
    }

    /// Performs one GET and classifies the result
    async fn attempt(&self, url: &Url) -> Result<Page, AttemptError> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_redirect() {
                    return Err(AttemptError::Terminal("redirect chain too long".to_string()));
                }
                let reason = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    "connection failed".to_string()
                } else {
                    e.to_string()
                };
                return Err(AttemptError::Transient(reason));
            }
        };

        let status = response.status();
        if status.is_client_error() {
            return Err(AttemptError::Terminal(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(AttemptError::Transient(format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| AttemptError::Transient(format!("body read failed: {}", e)))?;

        Ok(Page {
            url: final_url,
            html,
            fetched_at: Utc::now(),
        })
    }
}
