//! In-memory feed and post collections.
//!
//! [`ReaderState`] is the only place the collections are mutated. Every
//! mutation notifies the registered observers with the new collection, the
//! way a UI layer would re-render on change.

use crate::feed::{Feed, Post};

/// A change to one of the collections, carrying its new contents.
#[derive(Debug, Clone, Copy)]
pub enum StateChange<'a> {
    Feeds(&'a [Feed]),
    Posts(&'a [Post]),
}

impl StateChange<'_> {
    /// Symbolic path of the changed collection.
    pub fn path(&self) -> &'static str {
        match self {
            StateChange::Feeds(_) => "data.feeds",
            StateChange::Posts(_) => "data.posts",
        }
    }
}

/// Callback invoked after each state mutation.
pub type StateObserver = Box<dyn FnMut(StateChange<'_>) + Send>;

/// Owner of the known feeds and posts.
#[derive(Default)]
pub struct ReaderState {
    feeds: Vec<Feed>,
    posts: Vec<Post>,
    observers: Vec<StateObserver>,
}

impl std::fmt::Debug for ReaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderState")
            .field("feeds", &self.feeds)
            .field("posts", &self.posts)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ReaderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn feed_urls(&self) -> Vec<String> {
        self.feeds.iter().map(|f| f.url.clone()).collect()
    }

    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(StateChange<'_>) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Records a newly subscribed feed together with its initial posts.
    ///
    /// The feed is appended to the feed list and its posts after the
    /// existing ones.
    pub fn add_feed(&mut self, feed: Feed, posts: Vec<Post>) {
        debug_assert!(
            !self.feeds.iter().any(|f| f.url == feed.url),
            "feed url must be unique"
        );
        self.feeds.push(feed);
        self.notify(Change::Feeds);

        self.posts.extend(posts);
        self.notify(Change::Posts);
    }

    /// Places newly discovered posts ahead of the existing ones.
    ///
    /// Does nothing, and notifies nobody, when `posts` is empty.
    pub fn prepend_posts(&mut self, mut posts: Vec<Post>) {
        if posts.is_empty() {
            return;
        }
        posts.append(&mut self.posts);
        self.posts = posts;
        self.notify(Change::Posts);
    }

    fn notify(&mut self, which: Change) {
        let change = match which {
            Change::Feeds => StateChange::Feeds(&self.feeds),
            Change::Posts => StateChange::Posts(&self.posts),
        };
        for observer in &mut self.observers {
            observer(change);
        }
    }
}

#[derive(Clone, Copy)]
enum Change {
    Feeds,
    Posts,
}
