//! # feedwatch
//!
//! Polls a course-registration feed, detects new and changed rows against the
//! previous snapshot, and announces them to a Discord channel.

pub mod cli;
pub mod config;
pub mod discord;
pub mod error;
pub mod feed;
pub mod notify;
pub mod output;
pub mod schema;
pub mod snapshot;
pub mod tsv;
pub mod watcher;

pub use config::{Config, Profile};
pub use error::{Result, WatchError};
pub use snapshot::{diff, DiffEntry, Row, Snapshot, SnapshotCell};
pub use watcher::{CycleOutcome, WatchSettings, Watcher};
