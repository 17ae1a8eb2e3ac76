use serde::Deserialize;

/// Main configuration structure for newsreel
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default, rename = "seed")]
    pub seeds: Vec<SeedEntry>,
}

/// Crawl scheduling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum depth to crawl from seed URLs (omit for unbounded)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum concurrent requests against a single host
    #[serde(rename = "max-per-host", default = "default_max_per_host")]
    pub max_per_host: usize,

    /// Minimum time between consecutive requests to the same host (milliseconds)
    #[serde(rename = "host-delay-ms", default = "default_host_delay_ms")]
    pub host_delay_ms: u64,

    /// Whether to honor robots.txt on target hosts
    #[serde(rename = "respect-robots", default = "default_respect_robots")]
    pub respect_robots: bool,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// User agent string sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-attempt deadline (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry budget for transient failures (attempts = retries + 1)
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between retry attempts (milliseconds, doubles per retry)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// Link rule configuration: which discovered links stay in scope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesConfig {
    /// Hosts the crawl may touch; links elsewhere are dropped
    #[serde(rename = "allowed-hosts", default)]
    pub allowed_hosts: Vec<String>,

    /// Regex allow-patterns matched against normalized links.
    /// An empty list follows every link on an allowed host.
    #[serde(rename = "follow-patterns", default)]
    pub follow_patterns: Vec<String>,
}

/// Item extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// CSS selector for one listing entry
    #[serde(rename = "entry-selector", default = "default_entry_selector")]
    pub entry_selector: String,

    /// CSS selector for the anchor inside an entry
    #[serde(rename = "link-selector", default = "default_link_selector")]
    pub link_selector: String,
}

/// Item sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Which sink adapter to persist items into
    #[serde(default)]
    pub backend: SinkBackend,

    /// Connection URL for the redis backend
    #[serde(rename = "redis-url", default = "default_redis_url")]
    pub redis_url: String,

    /// Retry budget for a failing put before the page batch is abandoned
    #[serde(rename = "put-retries", default = "default_put_retries")]
    pub put_retries: u32,

    /// Backoff between put retries (milliseconds)
    #[serde(rename = "put-backoff-ms", default = "default_put_backoff_ms")]
    pub put_backoff_ms: u64,
}

/// Sink adapter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkBackend {
    /// In-process sink, contents discarded on exit
    #[default]
    Memory,
    /// Redis-backed sink
    Redis,
}

/// One crawl seed
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    /// Absolute URL to start crawling from (depth 0)
    pub url: String,
}

fn default_workers() -> usize {
    4
}

fn default_max_depth() -> u32 {
    u32::MAX
}

fn default_max_per_host() -> usize {
    2
}

fn default_host_delay_ms() -> u64 {
    100
}

fn default_respect_robots() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("newsreel/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_entry_selector() -> String {
    "td.title span.titleline".to_string()
}

fn default_link_selector() -> String {
    "a".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_put_retries() -> u32 {
    2
}

fn default_put_backoff_ms() -> u64 {
    250
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_depth: default_max_depth(),
            max_per_host: default_max_per_host(),
            host_delay_ms: default_host_delay_ms(),
            respect_robots: default_respect_robots(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            entry_selector: default_entry_selector(),
            link_selector: default_link_selector(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            backend: SinkBackend::default(),
            redis_url: default_redis_url(),
            put_retries: default_put_retries(),
            put_backoff_ms: default_put_backoff_ms(),
        }
    }
}

impl CrawlerConfig {
    /// Returns true when no depth bound was configured
    pub fn depth_unbounded(&self) -> bool {
        self.max_depth == u32::MAX
    }
}
