//! Centralized test fixtures and helpers for sg-watch tests.

use crate::aws::error::ScanError;
use crate::aws::InventoryOps;
use crate::types::{ReferenceSet, SecurityGroupRef, WatchList, WatchListEntry};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One scripted reference-collection response.
pub enum StubReferences {
    Refs(Vec<SecurityGroupRef>),
    Fail,
}

/// Scripted `InventoryOps` implementation for unit tests.
///
/// Inventories are fixed per region; reference collections are consumed
/// from a per-region queue, one response per call, so tests can script how
/// the world changes between resample ticks. An exhausted queue yields an
/// empty reference set.
#[derive(Default)]
pub struct StubInventory {
    inventories: HashMap<String, Vec<SecurityGroupRef>>,
    references: Mutex<HashMap<String, VecDeque<StubReferences>>>,
    collect_calls: AtomicUsize,
}

impl StubInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inventory(mut self, region: &str, groups: Vec<SecurityGroupRef>) -> Self {
        self.inventories.insert(region.to_string(), groups);
        self
    }

    pub fn push_references(&self, region: &str, refs: Vec<SecurityGroupRef>) {
        self.references
            .lock()
            .unwrap()
            .entry(region.to_string())
            .or_default()
            .push_back(StubReferences::Refs(refs));
    }

    pub fn push_failure(&self, region: &str) {
        self.references
            .lock()
            .unwrap()
            .entry(region.to_string())
            .or_default()
            .push_back(StubReferences::Fail);
    }

    /// Total number of `collect_references` calls across all regions.
    pub fn collect_calls(&self) -> usize {
        self.collect_calls.load(Ordering::SeqCst)
    }
}

impl InventoryOps for StubInventory {
    async fn collect_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        self.collect_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .references
            .lock()
            .unwrap()
            .get_mut(region)
            .and_then(VecDeque::pop_front);
        match next {
            Some(StubReferences::Refs(refs)) => Ok(refs.into_iter().collect()),
            Some(StubReferences::Fail) => Err(ScanError::Collection {
                region: region.to_string(),
                kind: "stub",
                code: None,
                message: "injected failure".to_string(),
            }),
            None => Ok(ReferenceSet::new()),
        }
    }

    async fn list_security_groups(
        &self,
        region: &str,
        exclude_default: bool,
    ) -> Result<Vec<SecurityGroupRef>, ScanError> {
        let groups = self.inventories.get(region).cloned().unwrap_or_default();
        Ok(crate::aws::inventory::filter_default(
            groups,
            exclude_default,
        ))
    }
}

/// Shorthand for a group reference.
pub fn sg(id: &str, name: Option<&str>) -> SecurityGroupRef {
    SecurityGroupRef::new(id, name)
}

/// Shorthand for a watch list entry.
pub fn watch_entry(region: &str, id: &str, name: Option<&str>) -> WatchListEntry {
    WatchListEntry {
        region: region.to_string(),
        group_id: id.to_string(),
        group_name: name.map(str::to_string),
    }
}

/// Build a watch list from entries.
pub fn watch_list(entries: Vec<WatchListEntry>) -> WatchList {
    entries.into_iter().collect()
}
