//! Crawl engine - run orchestration
//!
//! This module contains the engine driving a crawl run end to end:
//! - Seeding the frontier from configuration
//! - Keeping the worker pool topped up from the frontier
//! - Fetch, link discovery, extraction, and persistence per page
//! - Termination and the final run report
//!
//! A run ends when the frontier is empty and no task is in flight, or when
//! the cancellation token fires. Page-level failures never end a run; they
//! are counted and the run moves on.

use crate::config::{self, Config};
use crate::crawler::extractor::{Extractor, ListingExtractor};
use crate::crawler::fetcher::{build_http_client, FetchError, Fetcher};
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::crawler::parser::discover_links;
use crate::crawler::politeness::HostLimiter;
use crate::crawler::robots::RobotsGate;
use crate::crawler::rules::LinkRules;
use crate::item::Item;
use crate::sink::ItemSink;
use crate::url::{extract_host, normalize_url};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The frontier drained with no work left in flight
    Exhausted,

    /// Cancellation stopped the run before the frontier drained
    Cancelled,
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Pages fetched with a 2xx response
    pub pages_fetched: u64,

    /// Pages given up on (terminal rejection or exhausted retries)
    pub pages_failed: u64,

    /// Pages skipped because robots.txt disallowed them
    pub pages_disallowed: u64,

    /// Items written to the sink
    pub items_stored: u64,

    /// Items dropped after repeated sink failures
    pub items_abandoned: u64,

    /// Follow links accepted into the frontier (seeds included)
    pub links_enqueued: u64,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run stopped
    pub finished_at: DateTime<Utc>,

    /// How the run ended
    pub reason: FinishReason,
}

/// Per-task counters, absorbed into the run totals as workers finish
#[derive(Debug, Default)]
struct TaskOutcome {
    pages_fetched: u64,
    pages_failed: u64,
    pages_disallowed: u64,
    items_stored: u64,
    items_abandoned: u64,
    links_enqueued: u64,
}

impl TaskOutcome {
    fn absorb(&mut self, other: TaskOutcome) {
        self.pages_fetched += other.pages_fetched;
        self.pages_failed += other.pages_failed;
        self.pages_disallowed += other.pages_disallowed;
        self.items_stored += other.items_stored;
        self.items_abandoned += other.items_abandoned;
        self.links_enqueued += other.links_enqueued;
    }
}

/// Drives one crawl run
///
/// The engine is cheap to clone: every worker task gets its own handle onto
/// the shared frontier, limiter, rules, and sink.
#[derive(Clone)]
pub struct CrawlEngine {
    config: Arc<Config>,
    fetcher: Fetcher,
    rules: Arc<LinkRules>,
    extractor: Arc<dyn Extractor>,
    sink: Arc<dyn ItemSink>,
    frontier: Arc<Frontier>,
    hosts: Arc<HostLimiter>,
    robots: Arc<RobotsGate>,
}

impl CrawlEngine {
    /// Builds an engine from validated configuration
    ///
    /// Everything that can be rejected up front is rejected here: the config
    /// is validated, patterns and selectors are compiled, and the HTTP
    /// client is constructed. After this returns `Ok`, nothing but
    /// cancellation stops the run early.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `sink` - Destination for extracted items
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Ready to run
    /// * `Err(NewsreelError)` - Invalid configuration or client build failure
    pub fn new(config: Config, sink: Arc<dyn ItemSink>) -> crate::Result<Self> {
        config::validate(&config)?;

        let client = build_http_client(&config.fetch)?;
        let fetcher = Fetcher::new(client.clone(), &config.fetch);
        let rules = LinkRules::from_config(&config.rules)?;
        let extractor = ListingExtractor::from_config(&config.extract)?;
        let frontier = Frontier::new(config.crawler.max_depth);
        let hosts = HostLimiter::new(config.crawler.max_per_host, config.crawler.host_delay_ms);
        let robots = RobotsGate::new(
            client,
            config.fetch.user_agent.clone(),
            config.crawler.respect_robots,
        );

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            rules: Arc::new(rules),
            extractor: Arc::new(extractor),
            sink,
            frontier: Arc::new(frontier),
            hosts: Arc::new(hosts),
            robots: Arc::new(robots),
        })
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// The main loop:
    /// 1. Seeds the frontier (seeds bypass the follow rules)
    /// 2. Spawns workers until the pool is full or the frontier is empty
    /// 3. Reaps one finished worker and absorbs its counters
    /// 4. Repeats until the frontier is empty with nothing in flight
    ///
    /// On cancellation no new work is spawned; in-flight workers notice the
    /// token and wind down, and their partial counters still land in the
    /// report.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Crawl-wide cancellation token
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run summary, whichever way the run ended
    /// * `Err(NewsreelError)` - A seed URL failed to normalize
    pub async fn run(&self, cancel: CancellationToken) -> crate::Result<CrawlReport> {
        let started_at = Utc::now();
        let start = std::time::Instant::now();
        let mut totals = TaskOutcome::default();

        for seed in &self.config.seeds {
            let url = normalize_url(&seed.url)?;
            if self.frontier.enqueue(CrawlTask::seed(url)) {
                totals.links_enqueued += 1;
            }
        }
        tracing::info!(
            "Starting crawl: {} seed(s), {} worker(s)",
            totals.links_enqueued,
            self.config.crawler.workers
        );

        let mut workers: JoinSet<TaskOutcome> = JoinSet::new();

        loop {
            while !cancel.is_cancelled() && workers.len() < self.config.crawler.workers {
                match self.frontier.next() {
                    Some(task) => {
                        let engine = self.clone();
                        let cancel = cancel.clone();
                        workers.spawn(async move { engine.process_task(task, cancel).await });
                    }
                    None => break,
                }
            }

            match workers.join_next().await {
                Some(Ok(outcome)) => totals.absorb(outcome),
                Some(Err(e)) => {
                    tracing::error!("Worker task panicked: {}", e);
                    totals.pages_failed += 1;
                }
                None => break,
            }
        }

        let reason = if cancel.is_cancelled() {
            FinishReason::Cancelled
        } else {
            FinishReason::Exhausted
        };

        tracing::info!(
            "Crawl {} in {:?}: {} pages fetched, {} failed, {} items stored",
            match reason {
                FinishReason::Exhausted => "completed",
                FinishReason::Cancelled => "cancelled",
            },
            start.elapsed(),
            totals.pages_fetched,
            totals.pages_failed,
            totals.items_stored
        );

        Ok(CrawlReport {
            pages_fetched: totals.pages_fetched,
            pages_failed: totals.pages_failed,
            pages_disallowed: totals.pages_disallowed,
            items_stored: totals.items_stored,
            items_abandoned: totals.items_abandoned,
            links_enqueued: totals.links_enqueued,
            started_at,
            finished_at: Utc::now(),
            reason,
        })
    }

    /// Processes one frontier task
    ///
    /// The full page pipeline:
    /// 1. Robots gate
    /// 2. Host permit (held for the fetch, retries included)
    /// 3. Fetch with bounded retry
    /// 4. Link discovery, rule filtering, frontier enqueue
    /// 5. Item extraction and persistence
    ///
    /// Failures are absorbed into the outcome; nothing here ends the run.
    async fn process_task(&self, task: CrawlTask, cancel: CancellationToken) -> TaskOutcome {
        let mut outcome = TaskOutcome::default();

        if cancel.is_cancelled() {
            return outcome;
        }

        if !self.robots.is_allowed(&task.url).await {
            tracing::info!("Skipping {} (disallowed by robots.txt)", task.url);
            outcome.pages_disallowed = 1;
            return outcome;
        }

        let host = match extract_host(&task.url) {
            Some(host) => host,
            None => {
                tracing::warn!("No host in frontier URL {}, skipping", task.url);
                outcome.pages_failed = 1;
                return outcome;
            }
        };

        let page = {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => return outcome,
                permit = self.hosts.acquire(&host) => permit,
            };
            match self.fetcher.fetch(&task.url, &cancel).await {
                Ok(page) => page,
                Err(FetchError::Cancelled { .. }) => return outcome,
                Err(e) => {
                    tracing::warn!("Giving up on page: {}", e);
                    outcome.pages_failed = 1;
                    return outcome;
                }
            }
        };
        outcome.pages_fetched = 1;
        tracing::debug!("Fetched {} at depth {}", page.url, task.depth);

        let discovered = discover_links(&page.html, &page.url);
        for url in self.rules.filter_follow_links(&discovered) {
            if self.frontier.enqueue(CrawlTask::discovered(url, &task)) {
                outcome.links_enqueued += 1;
            }
        }

        let items = self.extractor.extract(&page.html);
        tracing::debug!("Extracted {} item(s) from {}", items.len(), page.url);

        let (stored, abandoned) = self.persist_items(&items, &page.url, &cancel).await;
        outcome.items_stored = stored;
        outcome.items_abandoned = abandoned;

        outcome
    }

    /// Writes one page's items to the sink, in extraction order
    ///
    /// Each put gets a bounded retry budget. When an item still cannot be
    /// written, the rest of the page is abandoned: items already stored are
    /// never re-put, so a later healthy page continues the key sequence
    /// without duplicates from this one.
    ///
    /// # Returns
    ///
    /// `(stored, abandoned)` counts for the page
    async fn persist_items(
        &self,
        items: &[Item],
        page_url: &Url,
        cancel: &CancellationToken,
    ) -> (u64, u64) {
        let retries = self.config.sink.put_retries;
        let backoff = Duration::from_millis(self.config.sink.put_backoff_ms);
        let mut stored = 0u64;

        for (position, item) in items.iter().enumerate() {
            let mut attempt = 0u32;
            loop {
                if cancel.is_cancelled() {
                    return (stored, (items.len() - position) as u64);
                }

                match self.sink.put(item).await {
                    Ok(key) => {
                        tracing::debug!("Stored \"{}\" as {}", item.title, key);
                        stored += 1;
                        break;
                    }
                    Err(e) if attempt < retries => {
                        attempt += 1;
                        tracing::warn!(
                            "Put of \"{}\" failed (attempt {}/{}): {}",
                            item.title,
                            attempt,
                            retries + 1,
                            e
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    Err(e) => {
                        let abandoned = (items.len() - position) as u64;
                        tracing::error!(
                            "Sink unavailable, abandoning {} item(s) from {}: {}",
                            abandoned,
                            page_url,
                            e
                        );
                        return (stored, abandoned);
                    }
                }
            }
        }

        (stored, 0)
    }
}
