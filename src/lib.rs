//! RSS aggregator core: subscribe to feeds through a content relay and keep
//! polling them for new posts.
//!
//! - [`feed`] - fetch, parse, deduplicate and normalize feed documents
//! - [`reader`] - submission flow and single refresh cycles
//! - [`scheduler`] - the background refresh loop
//! - [`state`] - in-memory feeds and posts with change notification

pub mod config;
pub mod error;
pub mod feed;
pub mod i18n;
pub mod reader;
pub mod scheduler;
pub mod state;
pub mod util;

pub use error::ReaderError;
pub use reader::{CycleReport, Reader};
pub use scheduler::{RefreshScheduler, SchedulerError, SchedulerHandle, Snapshot};
pub use state::{ReaderState, StateChange};
