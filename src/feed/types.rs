use serde::Serialize;

// ============================================================================
// Parsed (pre-normalization) records
// ============================================================================

/// Channel-level metadata extracted from a feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMeta {
    pub title: String,
    pub description: String,
}

/// A single `<item>` as it appears in the document, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedPost {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// Result of parsing one feed document. Posts are in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub feed: FeedMeta,
    pub posts: Vec<ParsedPost>,
}

// ============================================================================
// Normalized records
// ============================================================================

/// A subscribed feed. `url` is unique among known feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feed {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
}

/// A post belonging to a feed. `feed_id` refers to [`Feed::id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: String,
    pub feed_id: String,
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Post {
    /// The fields that take part in duplicate detection.
    pub fn content_key(&self) -> (&str, &str, &str) {
        (&self.title, &self.link, &self.description)
    }
}

impl ParsedPost {
    pub fn content_key(&self) -> (&str, &str, &str) {
        (&self.title, &self.link, &self.description)
    }
}
