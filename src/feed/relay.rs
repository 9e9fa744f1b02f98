use std::future::Future;

use futures::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::error::ReaderError;

/// Relay used when none is configured.
pub const DEFAULT_RELAY_URL: &str = "https://allorigins.hexlet.app/get";

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Anything that can turn a feed URL into raw feed XML.
///
/// The refresh loop and the submission flow only depend on this trait, so
/// tests can substitute an in-memory source for the HTTP relay.
pub trait FeedSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, ReaderError>> + Send;
}

/// Errors that can occur while talking to the relay.
///
/// All of them collapse into [`ReaderError::BadNetwork`] at the public
/// boundary; the detail is kept for logs.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Relay answered with a non-2xx status
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Relay body was not the expected JSON envelope
    #[error("Malformed relay response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Relay returned no `contents` for the target
    #[error("Relay returned no contents")]
    MissingContents,
    /// Relay endpoint is not a valid URL
    #[error("Invalid relay URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl From<RelayError> for ReaderError {
    fn from(err: RelayError) -> Self {
        ReaderError::BadNetwork(err.to_string())
    }
}

/// JSON envelope returned by the relay.
#[derive(Debug, Deserialize)]
struct RelayResponse {
    contents: Option<String>,
}

/// Fetches feeds through a content relay that wraps the target body in
/// `{"contents": "..."}`.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    endpoint: Url,
    max_body_bytes: usize,
}

impl RelayClient {
    /// Create a client for the given relay endpoint.
    pub fn new(endpoint: &str) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rss-aggregator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, endpoint)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, endpoint: &str) -> Result<Self, RelayError> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            max_body_bytes: MAX_BODY_SIZE,
        })
    }

    /// Override the response size limit.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Build the relay request URL for `feed_url`, with caching disabled.
    pub fn relay_url(&self, feed_url: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("url", feed_url)
            .append_pair("disableCache", "true");
        url
    }

    async fn fetch_contents(&self, feed_url: &str) -> Result<String, RelayError> {
        let request_url = self.relay_url(feed_url);
        tracing::debug!(feed = %feed_url, relay = %request_url, "Fetching feed through relay");

        let response = self.client.get(request_url).send().await?;

        if !response.status().is_success() {
            return Err(RelayError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, self.max_body_bytes).await?;
        let envelope: RelayResponse = serde_json::from_slice(&bytes)?;
        envelope.contents.ok_or(RelayError::MissingContents)
    }
}

impl FeedSource for RelayClient {
    async fn fetch(&self, url: &str) -> Result<String, ReaderError> {
        self.fetch_contents(url).await.map_err(|e| {
            tracing::debug!(feed = %url, error = %e, "Relay fetch failed");
            ReaderError::from(e)
        })
    }
}

/// Whether a declared Content-Length is over `limit`. Lengths that do not fit
/// in `usize` always are.
fn exceeds_limit(len: u64, limit: usize) -> bool {
    usize::try_from(len).map_or(true, |n| n > limit)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, RelayError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if exceeds_limit(len, limit) {
            return Err(RelayError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(RelayError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
