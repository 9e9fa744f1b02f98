//! Integration tests for a single refresh cycle: fetch, dedup, normalize and
//! merge across several feeds.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use rss_aggregator::feed::{Feed, SequentialIds};
use rss_aggregator::{Reader, StateChange};
use tokio::time::Instant;

use common::{rss, FakeSource, Reply};

fn seeded_feed(id: &str, url: &str) -> Feed {
    Feed {
        id: id.to_string(),
        title: String::new(),
        description: String::new(),
        url: url.to_string(),
    }
}

// ============================================================================
// Merging
// ============================================================================

#[tokio::test]
async fn test_new_item_is_merged_under_existing_feed() {
    let source = FakeSource::new();
    source.serve(
        "https://a.test/rss",
        rss("A", &[("T1", "https://a.test/1", "D1")]),
    );
    let mut reader = Reader::with_ids(source, SequentialIds::starting_at(10));
    reader
        .state_mut()
        .add_feed(seeded_feed("feed1", "https://a.test/rss"), Vec::new());

    let report = reader.refresh_cycle().await;

    assert_eq!(report.feeds, 1);
    assert_eq!(report.new_posts, 1);
    let posts = reader.state().posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "T1");
    assert_eq!(posts[0].link, "https://a.test/1");
    assert_eq!(posts[0].description, "D1");
    assert_eq!(posts[0].feed_id, "feed1");
    assert_eq!(posts[0].id, "post10");

    // The feed record itself is left alone
    assert_eq!(reader.state().feeds()[0], seeded_feed("feed1", "https://a.test/rss"));
}

#[tokio::test]
async fn test_unchanged_feed_merges_nothing_on_second_cycle() {
    let source = FakeSource::new();
    source.serve(
        "https://a.test/rss",
        rss("A", &[("T1", "https://a.test/1", "D1"), ("T2", "https://a.test/2", "D2")]),
    );
    let mut reader = Reader::new(source);
    reader.subscribe("https://a.test/rss").await.unwrap();
    let before = reader.state().posts().to_vec();

    let first = reader.refresh_cycle().await;
    let second = reader.refresh_cycle().await;

    assert_eq!(first.new_posts, 0);
    assert_eq!(second.new_posts, 0);
    assert_eq!(reader.state().posts(), before.as_slice());
}

#[tokio::test]
async fn test_new_posts_are_prepended_in_document_order() {
    let source = FakeSource::new();
    source.serve("https://a.test/rss", rss("A", &[("Old", "https://a.test/old", "o")]));
    let mut reader = Reader::new(source.clone());
    reader.subscribe("https://a.test/rss").await.unwrap();

    source.serve(
        "https://a.test/rss",
        rss(
            "A",
            &[
                ("New 1", "https://a.test/n1", "n1"),
                ("New 2", "https://a.test/n2", "n2"),
                ("Old", "https://a.test/old", "o"),
            ],
        ),
    );
    let report = reader.refresh_cycle().await;

    assert_eq!(report.new_posts, 2);
    let titles: Vec<&str> = reader.state().posts().iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["New 1", "New 2", "Old"]);
}

#[tokio::test]
async fn test_changed_description_counts_as_new_post() {
    let source = FakeSource::new();
    source.serve("https://a.test/rss", rss("A", &[("T", "https://a.test/1", "first")]));
    let mut reader = Reader::new(source.clone());
    reader.subscribe("https://a.test/rss").await.unwrap();

    source.serve("https://a.test/rss", rss("A", &[("T", "https://a.test/1", "edited")]));
    let report = reader.refresh_cycle().await;

    assert_eq!(report.new_posts, 1);
    assert_eq!(reader.state().posts().len(), 2);
}

#[tokio::test]
async fn test_post_shared_by_two_feeds_is_merged_once_per_cycle() {
    let shared = ("Shared", "https://news.test/shared", "same text");
    let source = FakeSource::new();
    source.serve("https://a.test/rss", rss("A", &[]));
    source.serve("https://b.test/rss", rss("B", &[]));
    let mut reader = Reader::new(source.clone());
    reader.subscribe("https://a.test/rss").await.unwrap();
    reader.subscribe("https://b.test/rss").await.unwrap();

    source.serve("https://a.test/rss", rss("A", &[shared]));
    source.serve("https://b.test/rss", rss("B", &[shared]));
    let report = reader.refresh_cycle().await;

    assert_eq!(report.new_posts, 1);
    assert_eq!(reader.state().posts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fetches_overlap_and_merge_in_completion_order() {
    let source = FakeSource::new();
    source.serve("https://a.test/rss", rss("A", &[]));
    source.serve("https://b.test/rss", rss("B", &[]));
    let mut reader = Reader::new(source.clone());
    reader.subscribe("https://a.test/rss").await.unwrap();
    reader.subscribe("https://b.test/rss").await.unwrap();

    source.set(
        "https://a.test/rss",
        Reply::Slow(
            Duration::from_millis(3000),
            rss("A", &[("A1", "https://a.test/1", "a")]),
        ),
    );
    source.set(
        "https://b.test/rss",
        Reply::Slow(
            Duration::from_millis(1000),
            rss("B", &[("B1", "https://b.test/1", "b")]),
        ),
    );

    let started = Instant::now();
    let report = reader.refresh_cycle().await;
    let elapsed = started.elapsed();

    // Both fetches run at once: the cycle lasts as long as the slowest feed
    assert!(elapsed >= Duration::from_millis(3000), "took {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3500), "took {elapsed:?}");
    assert_eq!(report.new_posts, 2);

    // B finished first, then A was prepended ahead of it
    let titles: Vec<&str> = reader.state().posts().iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["A1", "B1"]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_failing_feed_does_not_block_others() {
    let source = FakeSource::new();
    source.serve("https://a.test/rss", rss("A", &[]));
    source.serve("https://b.test/rss", rss("B", &[]));
    let mut reader = Reader::new(source.clone());
    reader.subscribe("https://a.test/rss").await.unwrap();
    reader.subscribe("https://b.test/rss").await.unwrap();

    source.fail("https://a.test/rss");
    source.serve("https://b.test/rss", rss("B", &[("B1", "https://b.test/1", "b")]));
    let report = reader.refresh_cycle().await;

    assert_eq!(report.new_posts, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "https://a.test/rss");
    assert_eq!(report.failures[0].1.key(), "badNetwork");

    let posts = reader.state().posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "B1");
    assert_eq!(posts[0].feed_id, reader.state().feeds()[1].id);
}

#[tokio::test]
async fn test_unparsable_refresh_leaves_posts_unchanged() {
    let source = FakeSource::new();
    source.serve("https://a.test/rss", rss("A", &[("T1", "https://a.test/1", "D1")]));
    let mut reader = Reader::new(source.clone());
    reader.subscribe("https://a.test/rss").await.unwrap();
    let before = reader.state().posts().to_vec();

    source.serve("https://a.test/rss", "<html><body>maintenance</body></html>");
    let report = reader.refresh_cycle().await;

    assert_eq!(report.new_posts, 0);
    assert_eq!(report.failures[0].1.key(), "invalidRSS");
    assert_eq!(reader.state().posts(), before.as_slice());
}

// ============================================================================
// Observers
// ============================================================================

#[tokio::test]
async fn test_observers_see_each_merge() {
    let source = FakeSource::new();
    source.serve("https://a.test/rss", rss("A", &[]));
    let mut reader = Reader::new(source.clone());

    let seen: Arc<Mutex<Vec<(&'static str, usize)>>> = Arc::default();
    let log = Arc::clone(&seen);
    reader.state_mut().add_observer(move |change: StateChange<'_>| {
        let len = match change {
            StateChange::Feeds(feeds) => feeds.len(),
            StateChange::Posts(posts) => posts.len(),
        };
        log.lock().unwrap().push((change.path(), len));
    });

    reader.subscribe("https://a.test/rss").await.unwrap();
    // Nothing new: no notification
    reader.refresh_cycle().await;
    source.serve("https://a.test/rss", rss("A", &[("T1", "https://a.test/1", "D1")]));
    reader.refresh_cycle().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("data.feeds", 1), ("data.posts", 0), ("data.posts", 1)]
    );
}
