//! Periodic polling of feed partitions into the shared state.
//!
//! Every tick spawns one independent cycle per partition. Cycles are never
//! joined against each other or against later ticks: a slow cycle keeps
//! running while the next tick fires, and whichever cycle merges last wins.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::CycleError;
use crate::fetch::FeedSource;
use crate::headway::aggregate_snapshot;
use crate::parser::{FeedDecoder, decode_trips};
use crate::state::SharedState;

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub feed_ids: Vec<String>,
    pub interval: Duration,
    pub fetch_timeout: Duration,
}

/// Outcome of a successful partition cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub feed_id: String,
    pub trips: usize,
    pub lines: usize,
}

pub struct Poller {
    settings: PollerSettings,
    source: Arc<dyn FeedSource>,
    decoder: Arc<dyn FeedDecoder>,
    state: SharedState,
}

impl Poller {
    pub fn new(
        settings: PollerSettings,
        source: Arc<dyn FeedSource>,
        decoder: Arc<dyn FeedDecoder>,
        state: SharedState,
    ) -> Self {
        Self {
            settings,
            source,
            decoder,
            state,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Polls forever. The first tick fires one full interval after start.
    pub async fn run(self: Arc<Self>) {
        info!(
            feeds = ?self.settings.feed_ids,
            interval_secs = self.settings.interval.as_secs(),
            "Starting poller"
        );

        let period = self.settings.interval;
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        let mut tick: u64 = 0;

        loop {
            interval.tick().await;
            tick += 1;
            debug!(tick, "Poll tick");
            self.spawn_tick(tick);
        }
    }

    /// Spawns one cycle per configured partition and returns their handles.
    ///
    /// Failures are logged inside each task and never reach the others.
    pub fn spawn_tick(self: &Arc<Self>, tick: u64) -> Vec<JoinHandle<()>> {
        self.settings
            .feed_ids
            .iter()
            .map(|feed_id| {
                let poller = Arc::clone(self);
                let feed_id = feed_id.clone();
                let span = tracing::info_span!("partition_cycle", tick, feed_id = %feed_id);

                tokio::spawn(
                    async move {
                        match poller.run_cycle(&feed_id).await {
                            Ok(report) => {
                                info!(trips = report.trips, lines = report.lines, "Partition merged")
                            }
                            Err(e) => error!(kind = e.kind(), error = %e, "Partition cycle failed"),
                        }
                    }
                    .instrument(span),
                )
            })
            .collect()
    }

    /// Fetches, decodes and estimates one partition, then merges the result.
    ///
    /// # Errors
    ///
    /// A failed or timed-out fetch, or an undecodable payload, ends the cycle
    /// before anything is merged.
    pub async fn run_cycle(&self, feed_id: &str) -> Result<CycleReport, CycleError> {
        let fetch_start = Instant::now();
        let bytes = match timeout(self.settings.fetch_timeout, self.source.fetch(feed_id)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(error)) => {
                return Err(CycleError::Fetch {
                    feed_id: feed_id.to_string(),
                    error,
                });
            }
            Err(_) => {
                return Err(CycleError::Timeout {
                    feed_id: feed_id.to_string(),
                    timeout: self.settings.fetch_timeout,
                });
            }
        };

        let elapsed = fetch_start.elapsed();
        if elapsed > self.settings.interval {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Feed fetch took longer than the poll interval"
            );
        }
        debug!(bytes = bytes.len(), "Feed bytes received, decoding");

        let trips =
            decode_trips(self.decoder.as_ref(), &bytes).map_err(|source| CycleError::Decode {
                feed_id: feed_id.to_string(),
                source,
            })?;

        let snapshot = aggregate_snapshot(&trips);
        let lines = self.state.merge(snapshot).await;

        Ok(CycleReport {
            feed_id: feed_id.to_string(),
            trips: trips.len(),
            lines,
        })
    }
}

/// Waits on the poller and a companion task, returning as soon as either one
/// fails. Neither task is expected to finish on its own.
pub async fn supervise(
    poller: JoinHandle<()>,
    companion: JoinHandle<()>,
) -> Result<(), JoinError> {
    tokio::try_join!(poller, companion)?;
    Ok(())
}
