use thiserror::Error;

/// Errors produced while submitting or refreshing feeds.
///
/// Each variant maps to a symbolic key (see [`ReaderError::key`]) that the
/// localization layer resolves to user-facing text. The core never formats
/// messages for end users itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// Transport or relay failure while fetching a feed
    #[error("Network error: {0}")]
    BadNetwork(String),
    /// Document could not be parsed as an RSS feed, or lacks required elements
    #[error("Invalid feed: {0}")]
    InvalidFeed(String),
    /// Submitted URL is not a valid http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Submitted URL is already subscribed
    #[error("Feed already exists: {0}")]
    AlreadyExists(String),
    /// Submitted URL was blank
    #[error("URL is required")]
    EmptyField,
}

impl ReaderError {
    /// Symbolic key used for localization lookups.
    pub fn key(&self) -> &'static str {
        match self {
            ReaderError::BadNetwork(_) => "badNetwork",
            ReaderError::InvalidFeed(_) => "invalidRSS",
            ReaderError::InvalidUrl(_) => "invalidURL",
            ReaderError::AlreadyExists(_) => "alreadyExists",
            ReaderError::EmptyField => "emptyField",
        }
    }

    /// Whether the error came from submission validation rather than I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ReaderError::InvalidUrl(_) | ReaderError::AlreadyExists(_) | ReaderError::EmptyField
        )
    }
}
