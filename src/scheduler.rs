//! Background refresh loop.
//!
//! [`RefreshScheduler`] alternates between two states:
//!
//! - **Refreshing**: one [`Reader::refresh_cycle`] over all known feeds
//! - **Idle**: waiting `interval` before the next cycle, while serving
//!   commands sent through the [`SchedulerHandle`]
//!
//! The first cycle starts immediately. The interval is measured from the end
//! of a cycle, so slow feeds stretch the effective period. The loop owns the
//! [`Reader`]; commands that arrive during a cycle are served once it ends.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::ReaderError;
use crate::feed::{Feed, FeedSource, Post};
use crate::reader::Reader;

/// Delay between the end of one refresh cycle and the start of the next.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The loop is no longer running
    #[error("Refresh scheduler is not running")]
    Stopped,
    /// A submission was rejected
    #[error(transparent)]
    Reader(#[from] ReaderError),
    /// The loop task panicked or was aborted
    #[error("Refresh scheduler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Copy of the collections at a point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub feeds: Vec<Feed>,
    pub posts: Vec<Post>,
}

enum Command {
    Subscribe {
        url: String,
        reply: oneshot::Sender<Result<Feed, ReaderError>>,
    },
    RefreshNow,
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
}

/// Periodically refreshes every feed known to a [`Reader`].
pub struct RefreshScheduler<S> {
    reader: Reader<S>,
    interval: Duration,
}

impl<S: FeedSource + 'static> RefreshScheduler<S> {
    pub fn new(reader: Reader<S>) -> Self {
        Self {
            reader,
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawns the loop on the current tokio runtime.
    pub fn start(self) -> SchedulerHandle<S> {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (stop_tx, stop_rx) = watch::channel(false);

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            feeds = self.reader.state().feeds().len(),
            "Refresh scheduler started"
        );

        let task = tokio::spawn(run(self.reader, self.interval, command_rx, stop_rx));

        SchedulerHandle {
            commands: command_tx,
            stop: stop_tx,
            task,
        }
    }
}

/// Control handle for a running [`RefreshScheduler`].
///
/// Dropping the handle stops the loop.
pub struct SchedulerHandle<S> {
    commands: mpsc::Sender<Command>,
    stop: watch::Sender<bool>,
    task: JoinHandle<Reader<S>>,
}

impl<S> SchedulerHandle<S> {
    /// Submits a new feed URL. Served when the loop is idle.
    pub async fn subscribe(&self, url: impl Into<String>) -> Result<Feed, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe {
            url: url.into(),
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| SchedulerError::Stopped)??)
    }

    /// Ends the current idle wait early and starts a cycle.
    pub async fn refresh_now(&self) -> Result<(), SchedulerError> {
        self.send(Command::RefreshNow).await
    }

    /// Current feeds and posts, taken once the loop is idle.
    pub async fn snapshot(&self) -> Result<Snapshot, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| SchedulerError::Stopped)
    }

    /// Stops the loop, interrupting any wait or in-flight cycle, and returns
    /// the reader with its accumulated state.
    pub async fn stop(self) -> Result<Reader<S>, SchedulerError> {
        // Receiver is gone only if the task already ended; join reports why
        let _ = self.stop.send(true);
        let reader = self.task.await?;
        tracing::info!("Refresh scheduler stopped");
        Ok(reader)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    async fn send(&self, command: Command) -> Result<(), SchedulerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SchedulerError::Stopped)
    }
}

/// Resolves once a stop was requested or the handle was dropped.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

enum Step {
    Stop,
    Refresh,
    Command(Command),
}

async fn run<S: FeedSource>(
    mut reader: Reader<S>,
    interval: Duration,
    mut commands: mpsc::Receiver<Command>,
    mut stop: watch::Receiver<bool>,
) -> Reader<S> {
    let mut cycle: u64 = 0;

    'cycles: loop {
        cycle += 1;
        tracing::debug!(cycle, "Refresh cycle starting");

        let report = tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => break 'cycles,
            report = reader.refresh_cycle() => report,
        };

        tracing::debug!(
            cycle,
            feeds = report.feeds,
            new_posts = report.new_posts,
            failed = report.failures.len(),
            "Refresh cycle finished"
        );

        let idle = tokio::time::sleep(interval);
        tokio::pin!(idle);

        loop {
            let step = tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => Step::Stop,
                _ = &mut idle => Step::Refresh,
                command = commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Stop,
                },
            };

            match step {
                Step::Stop => break 'cycles,
                Step::Refresh | Step::Command(Command::RefreshNow) => break,
                Step::Command(Command::Snapshot { reply }) => {
                    let _ = reply.send(Snapshot {
                        feeds: reader.state().feeds().to_vec(),
                        posts: reader.state().posts().to_vec(),
                    });
                }
                Step::Command(Command::Subscribe { url, reply }) => {
                    let result = tokio::select! {
                        biased;
                        _ = stop_requested(&mut stop) => break 'cycles,
                        result = reader.subscribe(&url) => result,
                    };
                    if let Err(e) = &result {
                        tracing::debug!(url = %url, error = %e, "Submission rejected");
                    }
                    // Caller may have given up waiting
                    let _ = reply.send(result);
                }
            }
        }
    }

    reader
}
