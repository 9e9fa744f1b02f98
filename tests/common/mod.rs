//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rss_aggregator::feed::FeedSource;
use rss_aggregator::ReaderError;
use tokio::time::Instant;

/// How the fake answers a fetch for one URL.
#[derive(Clone)]
pub enum Reply {
    Doc(String),
    Fail(ReaderError),
    /// Answer with the document after the given delay
    Slow(Duration, String),
    /// Never answer
    Hang,
}

/// In-memory [`FeedSource`] with per-URL replies and a log of every fetch.
///
/// Clones share the same replies and log, so a test can keep one clone and
/// hand the other to the reader.
#[derive(Clone, Default)]
pub struct FakeSource {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn serve(&self, url: &str, xml: impl Into<String>) {
        self.set(url, Reply::Doc(xml.into()));
    }

    pub fn fail(&self, url: &str) {
        self.set(url, Reply::Fail(ReaderError::BadNetwork("connection refused".into())));
    }

    /// Every fetch so far, with the tokio time it started.
    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter(|(u, _)| u == url)
            .map(|(_, at)| at)
            .collect()
    }
}

impl FeedSource for FakeSource {
    async fn fetch(&self, url: &str) -> Result<String, ReaderError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let reply = self.replies.lock().unwrap().get(url).cloned();
        match reply {
            Some(Reply::Doc(xml)) => Ok(xml),
            Some(Reply::Fail(e)) => Err(e),
            Some(Reply::Slow(delay, xml)) => {
                tokio::time::sleep(delay).await;
                Ok(xml)
            }
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(ReaderError::BadNetwork(format!("no reply for {url}"))),
        }
    }
}

/// An RSS 2.0 document with the given `(title, link, description)` items.
pub fn rss(title: &str, items: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\"?>\n<rss version=\"2.0\"><channel>\
         <title>{title}</title><description>{title} feed</description>"
    );
    for (title, link, description) in items {
        xml.push_str(&format!(
            "<item><title>{title}</title><link>{link}</link>\
             <description>{description}</description></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}
