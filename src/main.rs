use anyhow::{Context, Result};
use clap::Parser;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use rss_aggregator::config::Config;
use rss_aggregator::feed::{Feed, Post, RelayClient};
use rss_aggregator::i18n::{t, Language};
use rss_aggregator::util::{plain_text, strip_control_chars, truncate_to_width};
use rss_aggregator::{Reader, RefreshScheduler, StateChange};

/// Get the config directory path (~/.config/rss-aggregator/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("rss-aggregator"))
}

#[derive(Parser, Debug)]
#[command(
    name = "rss-aggregator",
    about = "Subscribe to RSS feeds through a relay and print new posts as they appear"
)]
struct Args {
    /// Config file (default: ~/.config/rss-aggregator/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feed URL to subscribe to, in addition to those in the config file
    #[arg(long = "feed", value_name = "URL")]
    feeds: Vec<String>,

    /// Delay between refresh cycles in milliseconds
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: Option<u64>,

    /// Relay endpoint URL
    #[arg(long, value_name = "URL")]
    relay: Option<String>,

    /// Message language (en or ru)
    #[arg(long, value_name = "LANG")]
    lang: Option<Language>,

    /// Print feeds and posts as JSON lines
    #[arg(long)]
    json: bool,

    /// Run a single refresh cycle after subscribing, then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;

    if let Some(relay) = args.relay {
        config.relay_url = relay;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.refresh_interval_ms = interval_ms;
    }
    if let Some(lang) = args.lang {
        config.language = lang;
    }
    config.feeds.extend(args.feeds);

    let source = RelayClient::new(&config.relay_url)
        .with_context(|| format!("Invalid relay URL '{}'", config.relay_url))?;
    let mut reader = Reader::new(source);
    reader
        .state_mut()
        .add_observer(post_printer(args.json, config.description_width));

    let lang = config.language;
    if !args.json {
        println!("{}", t(lang, "title"));
    }

    for url in &config.feeds {
        match reader.subscribe(url).await {
            Ok(feed) => eprintln!("{}: {}", t(lang, "successMessage"), feed.url),
            // Validation messages say everything; fetch failures carry detail
            Err(e) if e.is_validation() => eprintln!("{}: {}", t(lang, e.key()), url.trim()),
            Err(e) => eprintln!("{}: {} ({e})", t(lang, e.key()), url.trim()),
        }
    }

    if args.once {
        let report = reader.refresh_cycle().await;
        tracing::debug!(
            new_posts = report.new_posts,
            failed = report.failures.len(),
            "Single refresh finished"
        );
        return Ok(());
    }

    if reader.state().feeds().is_empty() {
        anyhow::bail!("No feeds to follow: pass --feed or list them in the config file");
    }

    let handle = RefreshScheduler::new(reader)
        .with_interval(config.refresh_interval())
        .start();

    wait_for_shutdown().await?;

    let reader = handle.stop().await.context("Refresh scheduler failed")?;
    tracing::info!(
        feeds = reader.state().feeds().len(),
        posts = reader.state().posts().len(),
        "Shutting down"
    );
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM on Unix.
async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down gracefully"),
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Received SIGINT, shutting down gracefully");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
    }
    Ok(())
}

/// Builds an observer that prints every post it has not printed before.
///
/// Post changes carry the whole collection, so already printed ids are
/// remembered. Feed titles are tracked from feed changes for the text header.
fn post_printer(json: bool, description_width: usize) -> impl FnMut(StateChange<'_>) + Send {
    let mut printed: HashSet<String> = HashSet::new();
    let mut feed_titles: HashMap<String, String> = HashMap::new();

    move |change: StateChange<'_>| match change {
        StateChange::Feeds(feeds) => {
            for feed in feeds {
                if feed_titles.contains_key(&feed.id) {
                    continue;
                }
                feed_titles.insert(feed.id.clone(), feed.title.clone());
                if json {
                    print_json("feed", feed);
                } else {
                    print_feed(feed);
                }
            }
        }
        StateChange::Posts(posts) => {
            // Newest first in the collection; print oldest unseen first
            for post in posts.iter().rev() {
                if !printed.insert(post.id.clone()) {
                    continue;
                }
                if json {
                    print_json("post", post);
                } else {
                    let feed_title = feed_titles.get(&post.feed_id).map(String::as_str);
                    print_post(post, feed_title, description_width);
                }
            }
        }
    }
}

fn print_json<T: serde::Serialize>(kind: &str, record: &T) {
    let line = serde_json::json!({ "type": kind, "data": record });
    println!("{line}");
}

fn print_feed(feed: &Feed) {
    println!(
        "== {} <{}>",
        strip_control_chars(&feed.title),
        strip_control_chars(&feed.url)
    );
}

fn print_post(post: &Post, feed_title: Option<&str>, description_width: usize) {
    let title = strip_control_chars(&post.title);
    match feed_title {
        Some(feed) => println!("[{}] {}", strip_control_chars(feed), title),
        None => println!("{title}"),
    }
    println!("    {}", strip_control_chars(&post.link));

    if description_width > 0 {
        let description = plain_text(&post.description);
        let description = strip_control_chars(&description);
        if !description.is_empty() {
            println!("    {}", truncate_to_width(&description, description_width));
        }
    }
}
