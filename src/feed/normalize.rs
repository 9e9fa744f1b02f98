use std::sync::atomic::{AtomicU64, Ordering};

use crate::feed::types::{Feed, ParsedFeed, Post};

/// Kind of record an id is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Feed,
    Post,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Feed => "feed",
            IdKind::Post => "post",
        }
    }
}

/// Source of unique record ids.
///
/// Implementations must never hand out the same id twice over their lifetime.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, kind: IdKind) -> String;
}

/// Monotonic counter shared by all id kinds, rendered as `feed<N>` / `post<N>`.
#[derive(Debug)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start counting from `first`. Useful for deterministic fixtures.
    pub fn starting_at(first: u64) -> Self {
        Self {
            counter: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, kind: IdKind) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", kind.prefix(), n)
    }
}

/// Assigns ids to a parsed feed and its posts.
///
/// The feed keeps `existing_id` when one is given (refresh of a known feed)
/// and otherwise receives a fresh id (first submission). Each post receives a
/// fresh id and is tagged with the feed's id.
pub fn normalize(
    parsed: ParsedFeed,
    url: &str,
    existing_id: Option<&str>,
    ids: &dyn IdGenerator,
) -> (Feed, Vec<Post>) {
    let feed_id = match existing_id {
        Some(id) => id.to_string(),
        None => ids.next_id(IdKind::Feed),
    };

    let posts = parsed
        .posts
        .into_iter()
        .map(|post| Post {
            id: ids.next_id(IdKind::Post),
            feed_id: feed_id.clone(),
            title: post.title,
            link: post.link,
            description: post.description,
        })
        .collect();

    let feed = Feed {
        id: feed_id,
        title: parsed.feed.title,
        description: parsed.feed.description,
        url: url.to_string(),
    };

    (feed, posts)
}
