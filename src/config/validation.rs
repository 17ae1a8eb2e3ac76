use crate::config::types::{
    Config, CrawlerConfig, ExtractConfig, FetchConfig, RulesConfig, SeedEntry, SinkBackend,
    SinkConfig,
};
use crate::url::normalize_url;
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
///
/// Configuration problems are the only fatal errors in a crawl run, so every
/// section is checked up front, before a single request goes out.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_rules_config(&config.rules)?;
    validate_extract_config(&config.extract)?;
    validate_sink_config(&config.sink)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawl scheduling configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.max_per_host < 1 {
        return Err(ConfigError::Validation(format!(
            "max_per_host must be >= 1, got {}",
            config.max_per_host
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 1, got {}",
            config.timeout_ms
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates link rule configuration
fn validate_rules_config(config: &RulesConfig) -> Result<(), ConfigError> {
    if config.allowed_hosts.is_empty() {
        return Err(ConfigError::Validation(
            "at least one allowed host is required".to_string(),
        ));
    }

    for host in &config.allowed_hosts {
        validate_host_string(host)?;
    }

    for pattern in &config.follow_patterns {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    Ok(())
}

/// Validates extraction configuration
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    Selector::parse(&config.entry_selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("entry-selector: {}", e)))?;

    Selector::parse(&config.link_selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("link-selector: {}", e)))?;

    Ok(())
}

/// Validates sink configuration
fn validate_sink_config(config: &SinkConfig) -> Result<(), ConfigError> {
    if config.backend == SinkBackend::Redis {
        let url = Url::parse(&config.redis_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid redis_url: {}", e)))?;

        if url.scheme() != "redis" && url.scheme() != "rediss" {
            return Err(ConfigError::Validation(format!(
                "redis_url must use the redis:// or rediss:// scheme, got '{}'",
                url.scheme()
            )));
        }
    }

    if config.put_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "put_retries must be <= 10, got {}",
            config.put_retries
        )));
    }

    Ok(())
}

/// Validates seed entries
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        normalize_url(&seed.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed.url, e)))?;
    }

    Ok(())
}

/// Validates a host string from the allow-list
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::Validation(
            "allowed host cannot be empty".to_string(),
        ));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Allowed host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Allowed host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Allowed host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::SeedEntry;

    fn valid_config() -> Config {
        Config {
            rules: RulesConfig {
                allowed_hosts: vec!["news.ycombinator.com".to_string()],
                follow_patterns: vec![r"news\?p=[0-2]".to_string()],
            },
            seeds: vec![SeedEntry {
                url: "https://news.ycombinator.com/news?p=1".to_string(),
            }],
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.crawler.workers = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_no_seeds_rejected() {
        let mut config = valid_config();
        config.seeds.clear();
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("seed")));
    }

    #[test]
    fn test_bad_seed_url_rejected() {
        let mut config = valid_config();
        config.seeds.push(SeedEntry {
            url: "ftp://example.com/list".to_string(),
        });
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_no_allowed_hosts_rejected() {
        let mut config = valid_config();
        config.rules.allowed_hosts.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut config = valid_config();
        config.rules.follow_patterns.push("news?p=[".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_bad_selector_rejected() {
        let mut config = valid_config();
        config.extract.entry_selector = "td..".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_redis_url_checked_only_for_redis_backend() {
        let mut config = valid_config();
        config.sink.redis_url = "http://not-redis".to_string();
        assert!(validate(&config).is_ok());

        config.sink.backend = SinkBackend::Redis;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_ip_allowed_host_accepted() {
        let mut config = valid_config();
        config.rules.allowed_hosts = vec!["127.0.0.1".to_string()];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_host_string() {
        assert!(validate_host_string("example.com").is_ok());
        assert!(validate_host_string("news.ycombinator.com").is_ok());
        assert!(validate_host_string("localhost").is_ok());

        assert!(validate_host_string("").is_err());
        assert!(validate_host_string(".example.com").is_err());
        assert!(validate_host_string("example.com.").is_err());
        assert!(validate_host_string("bad..dots.com").is_err());
        assert!(validate_host_string("spaces in.host").is_err());
    }
}
