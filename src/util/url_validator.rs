use url::Url;

use crate::error::ReaderError;

/// Validates a submitted feed URL against the already-subscribed ones.
///
/// Checks run in this order:
/// - blank input → [`ReaderError::EmptyField`]
/// - unparsable, non-http(s), or host-less URL → [`ReaderError::InvalidUrl`]
/// - URL already in `known_urls` → [`ReaderError::AlreadyExists`]
///
/// Returns the trimmed URL exactly as submitted, which becomes the feed's
/// identity for duplicate checks.
///
/// # Examples
///
/// ```
/// use rss_aggregator::util::validate_feed_url;
///
/// let known = vec!["https://a.test/rss".to_string()];
/// assert!(validate_feed_url("https://b.test/rss", &known).is_ok());
/// assert!(validate_feed_url("https://a.test/rss", &known).is_err());
/// assert!(validate_feed_url("   ", &known).is_err());
/// ```
pub fn validate_feed_url<S: AsRef<str>>(input: &str, known_urls: &[S]) -> Result<String, ReaderError> {
    let candidate = input.trim();
    if candidate.is_empty() {
        return Err(ReaderError::EmptyField);
    }

    let parsed =
        Url::parse(candidate).map_err(|e| ReaderError::InvalidUrl(format!("{candidate}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ReaderError::InvalidUrl(format!(
                "unsupported scheme: {scheme} (only http/https allowed)"
            )))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ReaderError::InvalidUrl(format!("{candidate}: missing host")));
    }

    if known_urls.iter().any(|known| known.as_ref() == candidate) {
        return Err(ReaderError::AlreadyExists(candidate.to_string()));
    }

    Ok(candidate.to_string())
}
