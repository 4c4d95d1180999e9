//! Watch list maintenance loop
//!
//! Owns the watch list after the initial scan and re-verifies it on a fixed
//! interval, dropping entries whose group has come back into use. Removal is
//! monotonic: a dropped entry is never re-added within a run.

use crate::aws::error::ScanError;
use crate::aws::InventoryOps;
use crate::types::{WatchList, WatchListEntry};
use futures::future::join_all;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What happened during one resample tick.
#[derive(Debug, Default)]
pub struct ResampleReport {
    /// Entries removed because their group is now in use.
    pub dropped: Vec<WatchListEntry>,
    /// Regions whose reference collection failed this tick. Their entries
    /// are left untouched and re-checked on the next tick.
    pub failed_regions: Vec<String>,
}

/// Timer-driven maintainer of the unused security group watch list.
///
/// The list is owned exclusively by this struct; all mutation happens inside
/// `resample_once`, which takes `&mut self`, so reads taken after `run`
/// returns can never observe a half-applied tick.
pub struct WatchListMaintainer<C> {
    ops: C,
    watch_list: WatchList,
    verbose: bool,
}

impl<C: InventoryOps> WatchListMaintainer<C> {
    pub fn new(ops: C, watch_list: WatchList, verbose: bool) -> Self {
        Self {
            ops,
            watch_list,
            verbose,
        }
    }

    pub fn watch_list(&self) -> &WatchList {
        &self.watch_list
    }

    pub fn into_watch_list(self) -> WatchList {
        self.watch_list
    }

    /// Run the resample loop until `cancel` fires.
    ///
    /// Ticks are single-flight: each resample is awaited inline, and a tick
    /// that falls due while one is still running is skipped rather than
    /// queued, so resamples never overlap.
    pub async fn run(&mut self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a tokio interval completes immediately; consume
        // it so the first resample happens one full interval after the scan.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Run deadline reached, stopping resample timer");
                    break;
                }
                _ = ticker.tick() => {
                    if self.watch_list.is_empty() {
                        debug!("Watch list empty, skipping resample");
                        continue;
                    }
                    let report = self.resample_once().await;
                    debug!(
                        dropped = report.dropped.len(),
                        failed_regions = report.failed_regions.len(),
                        remaining = self.watch_list.len(),
                        "Resample tick complete"
                    );
                }
            }
        }
    }

    /// Re-verify every watched entry once.
    ///
    /// Issues exactly one reference collection per distinct region in the
    /// watch list (entries of the same region share the call), waits for all
    /// of them, then applies the removals as one batch. The verbose snapshot
    /// is emitted only after all removals of the tick are applied.
    pub async fn resample_once(&mut self) -> ResampleReport {
        let regions = self.watch_list.regions();
        debug!(regions = regions.len(), entries = self.watch_list.len(), "Resampling watch list");

        let ops = &self.ops;
        let collections: Vec<(String, Result<_, ScanError>)> =
            join_all(regions.iter().map(|region| async move {
                (region.clone(), ops.collect_references(region).await)
            }))
            .await;

        let mut report = ResampleReport::default();
        for (region, result) in collections {
            match result {
                Ok(refs) => {
                    for entry in self.watch_list.remove_in_use(&region, &refs) {
                        info!(
                            region = %entry.region,
                            sg_id = %entry.group_id,
                            reason = "now in use",
                            "Dropped {} from unused security groups",
                            entry.group_id
                        );
                        report.dropped.push(entry);
                    }
                }
                Err(e) => {
                    warn!(
                        region = %region,
                        error = %e,
                        "Reference collection failed, keeping entries until next tick"
                    );
                    report.failed_regions.push(region);
                }
            }
        }

        if self.verbose {
            self.log_watch_list();
        }
        report
    }

    /// Emit the current watch list as one consistent snapshot.
    fn log_watch_list(&self) {
        info!(count = self.watch_list.len(), "Current unused security groups");
        for entry in self.watch_list.entries() {
            info!(
                region = %entry.region,
                sg_id = %entry.group_id,
                sg_name = entry.group_name.as_deref().unwrap_or(""),
                "Watching"
            );
        }
    }
}
