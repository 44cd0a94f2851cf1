//! The poll loop: fetch, parse, diff, announce

use crate::config::Config;
use crate::discord::Notifier;
use crate::feed::FeedSource;
use crate::notify::MessageStyle;
use crate::snapshot::{diff, SnapshotCell};
use crate::tsv::{parse_feed, Delimiters};
use chrono::Datelike;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Per-cycle behaviour of a [`Watcher`]
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub interval: Duration,
    pub batch_size: usize,
    pub delimiters: Delimiters,
    pub style: MessageStyle,
    /// Skip snapshots with rows too short for the layout instead of announcing them
    pub reject_malformed: bool,
}

impl WatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            batch_size: config.batch_size,
            delimiters: config.delimiters.clone(),
            style: MessageStyle::with_layout(config.layout.clone()),
            reject_malformed: config.reject_malformed,
        }
    }
}

/// What a single poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fetch failed; the held snapshot is unchanged
    FetchFailed,
    /// Snapshot failed layout validation with `reject_malformed` set; held snapshot unchanged
    Rejected { violations: usize },
    /// First successful fetch; stored without announcing
    Seeded { rows: usize },
    /// No new or changed rows
    Unchanged,
    /// Changes announced
    Notified {
        entries: usize,
        batches_sent: usize,
        batches_failed: usize,
    },
    /// Changes found but the channel could not be resolved; snapshot still advanced
    ChannelUnavailable { entries: usize },
}

/// Owns the previous snapshot and drives one cycle at a time
pub struct Watcher<F, N> {
    feed: F,
    notifier: N,
    settings: WatchSettings,
    cell: SnapshotCell,
}

impl<F: FeedSource, N: Notifier> Watcher<F, N> {
    pub fn new(feed: F, notifier: N, settings: WatchSettings) -> Self {
        Self {
            feed,
            notifier,
            settings,
            cell: SnapshotCell::Empty,
        }
    }

    pub fn snapshot(&self) -> &SnapshotCell {
        &self.cell
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run a single fetch-diff-announce cycle
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let payload = match self.feed.fetch().await {
            Ok(payload) => payload,
            Err(e) if e.is_transient() => {
                log::warn!("Feed request failed, retrying next poll: {}", e);
                return CycleOutcome::FetchFailed;
            }
            Err(e) => {
                log::error!("Feed request failed: {}", e);
                return CycleOutcome::FetchFailed;
            }
        };

        let feed = parse_feed(&payload, &self.settings.delimiters);
        let current = feed.snapshot;
        log::debug!("Feed stamp '{}', {} row(s)", feed.stamp, current.len());

        for (key, count) in current.duplicate_keys() {
            log::warn!("Key '{}' appears on {} rows; first occurrence wins", key, count);
        }

        let report = self.settings.style.layout.validate(&current);
        if !report.is_clean() {
            for v in &report.violations {
                log::debug!(
                    "Row {} ('{}') has {} field(s), missing {}",
                    v.row_index,
                    v.key,
                    v.field_count,
                    v.missing.join(", ")
                );
            }
            let violations = report.violations.len();
            if self.settings.reject_malformed {
                if let Err(e) = report.into_result() {
                    log::error!("Rejecting snapshot: {}", e);
                }
                return CycleOutcome::Rejected { violations };
            }
            log::warn!(
                "{} row(s) do not fit layout '{}'; missing fields render as placeholders",
                violations,
                report.layout
            );
        }

        let entries = match self.cell.get() {
            None => None,
            Some(previous) if previous == &current => Some(Vec::new()),
            Some(previous) => Some(diff(previous, &current)),
        };

        let rows = current.len();
        self.cell.replace(current);
        let Some(entries) = entries else {
            log::info!("Stored initial snapshot with {} row(s)", rows);
            return CycleOutcome::Seeded { rows };
        };

        if entries.is_empty() {
            log::debug!("No new or changed rows");
            return CycleOutcome::Unchanged;
        }

        for entry in entries.iter().filter(|e| !e.is_new()) {
            log::info!("Changed row: {:?}", entry.current.fields());
        }

        if let Err(e) = self.notifier.resolve_channel().await {
            log::error!("Cannot announce {} change(s): {}", entries.len(), e);
            return CycleOutcome::ChannelUnavailable {
                entries: entries.len(),
            };
        }

        let year = chrono::Local::now().year();
        let embeds = self
            .settings
            .style
            .render_batches(&entries, self.settings.batch_size, year);
        let mut batches_sent = 0;
        let mut batches_failed = 0;
        for embed in &embeds {
            match self.notifier.send(embed).await {
                Ok(()) => batches_sent += 1,
                Err(e) => {
                    log::error!("Failed to send message with {} change(s): {}", embed.fields.len(), e);
                    batches_failed += 1;
                }
            }
        }

        log::info!(
            "Announced {} change(s) in {} message(s)",
            entries.len(),
            batches_sent
        );
        CycleOutcome::Notified {
            entries: entries.len(),
            batches_sent,
            batches_failed,
        }
    }

    /// Poll on the configured interval until `shutdown` resolves.
    ///
    /// The first cycle runs immediately. A cycle in progress when `shutdown`
    /// resolves is dropped.
    pub async fn run<S>(&mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutdown requested, stopping poll loop");
                    break;
                }
                _ = async {
                    interval.tick().await;
                    let outcome = self.run_cycle().await;
                    log::debug!("Cycle outcome: {:?}", outcome);
                } => {}
            }
        }
    }
}
