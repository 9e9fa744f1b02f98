//! Feed retrieval and processing pipeline.
//!
//! A refresh of one feed flows through these submodules in order:
//!
//! - [`relay`] - HTTP fetch of the feed XML through a content relay
//! - [`parser`] - RSS parsing into channel metadata and items
//! - [`dedup`] - removal of items that are already known
//! - [`normalize`] - id assignment and feed ownership tagging
//!
//! # Example
//!
//! ```ignore
//! use rss_aggregator::feed::{normalize, parse_feed, unique_posts, FeedSource, RelayClient, SequentialIds};
//!
//! let relay = RelayClient::new(DEFAULT_RELAY_URL)?;
//! let parsed = parse_feed(&relay.fetch("https://example.com/rss").await?)?;
//! let fresh = unique_posts(parsed.posts, &known_posts);
//! ```

mod dedup;
mod normalize;
mod parser;
mod relay;
mod types;

pub use dedup::unique_posts;
pub use normalize::{normalize, IdGenerator, IdKind, SequentialIds};
pub use parser::parse_feed;
pub use relay::{FeedSource, RelayClient, RelayError, DEFAULT_RELAY_URL};
pub use types::{Feed, FeedMeta, ParsedFeed, ParsedPost, Post};
