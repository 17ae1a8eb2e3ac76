use crate::UrlError;
use url::Url;

/// Normalizes a URL into the identity used for frontier deduplication
///
/// # Normalization Steps
///
/// 1. Parse; malformed input is rejected
/// 2. Reject any scheme besides `http` and `https`
/// 3. Case-fold the scheme and host (the parser already does this)
/// 4. Drop default ports (`:80` for `http`, `:443` for `https`)
/// 5. Drop the fragment
///
/// The query string survives verbatim, order included. On a paginated listing
/// the query carries page identity (`news?p=1` vs `news?p=2`); rewriting it
/// would merge distinct pages into one frontier entry.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - The normalized URL
/// * `Err(UrlError)` - Malformed input, unsupported scheme, or no host
///
/// # Examples
///
/// ```
/// use newsreel::url::normalize_url;
///
/// let url = normalize_url("HTTP://EXAMPLE.COM:80/news?p=2#fold").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/news?p=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(UrlError::InvalidScheme(format!(
                "expected http or https, got '{}'",
                other
            )));
        }
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    // The parser handles case-folding and default-port removal; the fragment
    // is the one component it keeps that dedup identity must not see.
    url.set_fragment(None);

    Ok(url)
}
