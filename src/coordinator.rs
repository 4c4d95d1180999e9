//! Multi-region scan coordination
//!
//! Fans the regional scanner out across all regions concurrently and merges
//! the results. A failed region is isolated: it is recorded and surfaced in
//! the summary but does not abort the scan of the other regions.

use crate::aws::error::ScanError;
use crate::aws::InventoryOps;
use crate::scanner::scan_region;
use crate::types::{SecurityGroupRef, WatchList, WatchListEntry};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Result of the initial multi-region scan.
#[derive(Debug, Default)]
pub struct RegionScanOutcome {
    /// Unused groups per region; regions with none are omitted.
    pub unused: BTreeMap<String, Vec<SecurityGroupRef>>,
    /// Regions whose scan failed, with the error.
    pub failures: BTreeMap<String, ScanError>,
}

impl RegionScanOutcome {
    pub fn total_unused(&self) -> usize {
        self.unused.values().map(Vec::len).sum()
    }

    /// Materialize the watch list from the per-region results.
    pub fn into_watch_list(self) -> WatchList {
        self.unused
            .into_iter()
            .flat_map(|(region, groups)| {
                groups.into_iter().map(move |group| WatchListEntry {
                    region: region.clone(),
                    group_id: group.group_id,
                    group_name: group.group_name,
                })
            })
            .collect()
    }
}

/// Scan every region concurrently for unused security groups.
///
/// Emits a summary count and one line per `(region, group)` found, then
/// hands the outcome to the caller for watch list materialization.
pub async fn scan_all_regions<C: InventoryOps>(
    ops: &C,
    regions: &[String],
    exclude_default: bool,
) -> RegionScanOutcome {
    info!(regions = regions.len(), "Looking for unused security groups");

    let scans = regions.iter().map(|region| async move {
        (
            region.clone(),
            scan_region(ops, region, exclude_default).await,
        )
    });
    let results = join_all(scans).await;

    let mut outcome = RegionScanOutcome::default();
    for (region, result) in results {
        match result {
            Ok(unused) => {
                if !unused.is_empty() {
                    outcome.unused.insert(region, unused);
                }
            }
            Err(e) => {
                warn!(region = %region, error = %e, "Region scan failed, omitting region from results");
                outcome.failures.insert(region, e);
            }
        }
    }

    info!(
        count = outcome.total_unused(),
        failed_regions = outcome.failures.len(),
        "Found unused security groups"
    );
    for (region, groups) in &outcome.unused {
        for group in groups {
            info!(
                region = %region,
                sg_id = %group.group_id,
                sg_name = group.group_name.as_deref().unwrap_or(""),
                "Unused security group"
            );
        }
    }

    outcome
}
