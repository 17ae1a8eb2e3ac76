use url::Url;

/// Extracts the host from a URL
///
/// The host keys the politeness ledger and the allow-list check, so it is
/// always returned lowercase.
///
/// # Arguments
///
/// * `url` - The URL to extract the host from
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use newsreel::url::extract_host;
///
/// let url = Url::parse("https://news.ycombinator.com/news?p=1").unwrap();
/// assert_eq!(extract_host(&url), Some("news.ycombinator.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
