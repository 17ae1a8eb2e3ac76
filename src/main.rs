//! Newsreel main entry point
//!
//! This is the command-line interface for the newsreel listing crawler.

use anyhow::Context;
use clap::Parser;
use newsreel::config::{load_config_with_hash, Config, SinkBackend};
use newsreel::crawler::{CrawlEngine, CrawlReport, FinishReason};
use newsreel::sink::{read_all, ItemSink, MemorySink, RedisSink};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Newsreel: a paginated listing crawler
///
/// Newsreel walks the pagination links of a listing site within configured
/// bounds, extracts title/URL items from each page, and persists them under
/// dense sequential keys for a downstream consumer.
#[derive(Parser, Debug)]
#[command(name = "newsreel")]
#[command(version)]
#[command(about = "A paginated listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without fetching
    #[arg(long, conflicts_with = "dump_items")]
    dry_run: bool,

    /// Print items already stored in the configured sink and exit
    #[arg(long, conflicts_with = "dry_run")]
    dump_items: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let sink = build_sink(&config).await?;

    if cli.dump_items {
        return handle_dump_items(sink.as_ref()).await;
    }

    handle_crawl(config, sink).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("newsreel=info,warn"),
            1 => EnvFilter::new("newsreel=debug,info"),
            2 => EnvFilter::new("newsreel=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the configured item sink
///
/// A redis backend that cannot be reached here is a startup failure; once
/// the crawl is running, sink trouble only abandons individual pages.
async fn build_sink(config: &Config) -> anyhow::Result<Arc<dyn ItemSink>> {
    match config.sink.backend {
        SinkBackend::Memory => {
            tracing::info!("Using in-memory sink (items discarded on exit)");
            Ok(Arc::new(MemorySink::default()))
        }
        SinkBackend::Redis => {
            tracing::info!("Connecting to redis at {}", config.sink.redis_url);
            let sink = RedisSink::connect(&config.sink.redis_url)
                .await
                .context("redis sink unavailable at startup")?;
            Ok(Arc::new(sink))
        }
    }
}

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Newsreel Dry Run ===\n");

    println!("Crawler:");
    println!("  Workers: {}", config.crawler.workers);
    if config.crawler.depth_unbounded() {
        println!("  Max depth: unbounded");
    } else {
        println!("  Max depth: {}", config.crawler.max_depth);
    }
    println!("  Max per host: {}", config.crawler.max_per_host);
    println!("  Host delay: {}ms", config.crawler.host_delay_ms);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}ms", config.fetch.timeout_ms);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.fetch.max_retries, config.fetch.retry_backoff_ms
    );

    println!("\nRules:");
    println!("  Allowed hosts ({}):", config.rules.allowed_hosts.len());
    for host in &config.rules.allowed_hosts {
        println!("    - {}", host);
    }
    if config.rules.follow_patterns.is_empty() {
        println!("  Follow patterns: (none; every link on an allowed host)");
    } else {
        println!("  Follow patterns ({}):", config.rules.follow_patterns.len());
        for pattern in &config.rules.follow_patterns {
            println!("    - {}", pattern);
        }
    }

    println!("\nExtract:");
    println!("  Entry selector: {}", config.extract.entry_selector);
    println!("  Link selector: {}", config.extract.link_selector);

    println!("\nSink:");
    match config.sink.backend {
        SinkBackend::Memory => println!("  Backend: memory"),
        SinkBackend::Redis => println!("  Backend: redis ({})", config.sink.redis_url),
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed.url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URL(s)", config.seeds.len());

    Ok(())
}

/// Handles the --dump-items mode: prints stored items in key order
async fn handle_dump_items(sink: &dyn ItemSink) -> anyhow::Result<()> {
    let entries = read_all(sink).await.context("failed to read items back")?;

    for (key, item) in &entries {
        println!("{}\t{}\t{}", key, item.title, item.url);
    }

    tracing::info!("Dumped {} item(s)", entries.len());
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, sink: Arc<dyn ItemSink>) -> anyhow::Result<()> {
    let engine = CrawlEngine::new(config, sink)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            interrupt.cancel();
        }
    });

    let report = engine.run(cancel).await?;
    print_report(&report);

    if report.reason == FinishReason::Cancelled {
        anyhow::bail!("crawl cancelled before the frontier drained");
    }

    Ok(())
}

/// Prints the end-of-run summary
fn print_report(report: &CrawlReport) {
    let elapsed = report.finished_at - report.started_at;

    println!("=== Crawl Report ===");
    println!("Pages fetched:    {}", report.pages_fetched);
    println!("Pages failed:     {}", report.pages_failed);
    println!("Pages disallowed: {}", report.pages_disallowed);
    println!("Items stored:     {}", report.items_stored);
    println!("Items abandoned:  {}", report.items_abandoned);
    println!("Links enqueued:   {}", report.links_enqueued);
    println!(
        "Elapsed:          {}.{:03}s",
        elapsed.num_seconds(),
        elapsed.num_milliseconds().rem_euclid(1000)
    );
    println!(
        "Finished:         {}",
        match report.reason {
            FinishReason::Exhausted => "frontier exhausted",
            FinishReason::Cancelled => "cancelled",
        }
    );
}
