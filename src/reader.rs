//! Submission and refresh flows over the shared reader state.

use futures::stream::{FuturesUnordered, StreamExt};

use crate::error::ReaderError;
use crate::feed::{
    normalize, parse_feed, unique_posts, Feed, FeedSource, IdGenerator, ParsedFeed,
    SequentialIds,
};
use crate::state::ReaderState;
use crate::util::validate_feed_url;

/// Outcome of one refresh cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Number of feeds polled
    pub feeds: usize,
    /// Posts merged into the state across all feeds
    pub new_posts: usize,
    /// Feeds that failed, by URL, with the reason
    pub failures: Vec<(String, ReaderError)>,
}

/// Owns the reader state and the collaborators that feed it.
///
/// All mutation of [`ReaderState`] goes through this type, from the task
/// that owns it.
pub struct Reader<S> {
    source: S,
    ids: Box<dyn IdGenerator>,
    state: ReaderState,
}

impl<S: FeedSource> Reader<S> {
    pub fn new(source: S) -> Self {
        Self::with_ids(source, SequentialIds::new())
    }

    /// Create a reader with a specific id generator.
    pub fn with_ids(source: S, ids: impl IdGenerator + 'static) -> Self {
        Self {
            source,
            ids: Box::new(ids),
            state: ReaderState::new(),
        }
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ReaderState {
        &mut self.state
    }

    /// Subscribes to a new feed.
    ///
    /// Validates `input` against the known feeds, fetches and parses the
    /// document, then stores the feed and all of its posts.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::EmptyField`], [`ReaderError::InvalidUrl`],
    ///   [`ReaderError::AlreadyExists`] from validation
    /// - [`ReaderError::BadNetwork`] if the fetch fails
    /// - [`ReaderError::InvalidFeed`] if the document is not a usable RSS feed
    ///
    /// The state is untouched on error.
    pub async fn subscribe(&mut self, input: &str) -> Result<Feed, ReaderError> {
        let url = validate_feed_url(input, &self.state.feed_urls())?;

        let xml = self.source.fetch(&url).await?;
        let parsed = parse_feed(&xml)?;
        let (feed, posts) = normalize(parsed, &url, None, self.ids.as_ref());

        tracing::info!(
            feed = %feed.url,
            id = %feed.id,
            title = %feed.title,
            posts = posts.len(),
            "Subscribed to feed"
        );

        self.state.add_feed(feed.clone(), posts);
        Ok(feed)
    }

    /// Re-polls every known feed once and merges newly discovered posts.
    ///
    /// All fetches are in flight at the same time. Results are merged in the
    /// order they complete: each successful feed is deduplicated against the
    /// posts known at that moment and its new posts are prepended. A failed
    /// feed is logged and contributes nothing; it never affects the others.
    pub async fn refresh_cycle(&mut self) -> CycleReport {
        let feeds: Vec<Feed> = self.state.feeds().to_vec();
        let mut report = CycleReport {
            feeds: feeds.len(),
            ..CycleReport::default()
        };

        let mut pending = FuturesUnordered::new();
        for feed in feeds {
            pending.push(fetch_parsed(&self.source, feed));
        }

        while let Some((feed, result)) = pending.next().await {
            match result {
                Ok(parsed) => {
                    let fresh = unique_posts(parsed.posts, self.state.posts());
                    if fresh.is_empty() {
                        tracing::debug!(feed = %feed.url, "No new posts");
                        continue;
                    }

                    let parsed = ParsedFeed {
                        feed: parsed.feed,
                        posts: fresh,
                    };
                    let (_, posts) =
                        normalize(parsed, &feed.url, Some(feed.id.as_str()), self.ids.as_ref());

                    tracing::info!(feed = %feed.url, new_posts = posts.len(), "New posts found");
                    report.new_posts += posts.len();
                    self.state.prepend_posts(posts);
                }
                Err(e) => {
                    tracing::warn!(feed = %feed.url, error = %e, "Feed refresh failed");
                    report.failures.push((feed.url, e));
                }
            }
        }

        report
    }
}

async fn fetch_parsed<S: FeedSource>(
    source: &S,
    feed: Feed,
) -> (Feed, Result<ParsedFeed, ReaderError>) {
    let result = match source.fetch(&feed.url).await {
        Ok(xml) => parse_feed(&xml),
        Err(e) => Err(e),
    };
    (feed, result)
}
