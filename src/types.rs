//! Core data types for unused security group tracking

use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

/// A security group reference extracted from some AWS resource.
///
/// Identity is `group_id` only; `group_name` is informational and never
/// participates in equality or deduplication (several source kinds only
/// report the bare id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupRef {
    pub group_id: String,
    pub group_name: Option<String>,
}

impl SecurityGroupRef {
    pub fn new(group_id: impl Into<String>, group_name: Option<&str>) -> Self {
        Self {
            group_id: group_id.into(),
            group_name: group_name.filter(|n| !n.is_empty()).map(str::to_string),
        }
    }
}

/// Point-in-time set of security groups referenced by resources in one region.
///
/// Deduplicated by group id. When the same id arrives more than once, the
/// first non-empty name wins; a later duplicate can only fill in a missing
/// name, never overwrite one.
#[derive(Debug, Default)]
pub struct ReferenceSet {
    groups: HashMap<String, Option<String>>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference to `group_id`. Empty names are treated as absent.
    pub fn insert(&mut self, group_id: &str, group_name: Option<&str>) {
        let name = group_name.filter(|n| !n.is_empty()).map(str::to_string);
        match self.groups.entry(group_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_none() && name.is_some() {
                    occupied.insert(name);
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(name);
            }
        }
    }

    /// Merge another reference set into this one, keeping the first-seen
    /// non-empty name for each id.
    pub fn absorb(&mut self, other: ReferenceSet) {
        for (group_id, name) in other.groups {
            self.insert(&group_id, name.as_deref());
        }
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn name_of(&self, group_id: &str) -> Option<&str> {
        self.groups.get(group_id).and_then(|n| n.as_deref())
    }
}

impl FromIterator<SecurityGroupRef> for ReferenceSet {
    fn from_iter<T: IntoIterator<Item = SecurityGroupRef>>(iter: T) -> Self {
        let mut set = ReferenceSet::new();
        for group in iter {
            set.insert(&group.group_id, group.group_name.as_deref());
        }
        set
    }
}

/// A security group believed unused, tagged with the region it lives in.
///
/// Serialized field names match the snapshot wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchListEntry {
    pub region: String,
    pub group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

/// The set of groups currently believed unused.
///
/// Owned exclusively by the watch list maintainer: entries are inserted once
/// after the initial multi-region scan and only ever removed, never re-added.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct WatchList {
    entries: Vec<WatchListEntry>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: WatchListEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[WatchListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, region: &str, group_id: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.region == region && e.group_id == group_id)
    }

    /// Distinct regions currently represented in the watch list.
    pub fn regions(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.region.clone()).collect()
    }

    /// Remove every entry of `region` whose group now appears in `refs`.
    ///
    /// The membership check and the removal happen in one pass, so a caller
    /// observing the list afterwards sees the whole batch applied at once.
    /// Returns the removed entries.
    pub fn remove_in_use(&mut self, region: &str, refs: &ReferenceSet) -> Vec<WatchListEntry> {
        let mut dropped = Vec::new();
        self.entries.retain(|entry| {
            if entry.region == region && refs.contains(&entry.group_id) {
                dropped.push(entry.clone());
                false
            } else {
                true
            }
        });
        dropped
    }
}

impl FromIterator<WatchListEntry> for WatchList {
    fn from_iter<T: IntoIterator<Item = WatchListEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(region: &str, group_id: &str) -> WatchListEntry {
        WatchListEntry {
            region: region.to_string(),
            group_id: group_id.to_string(),
            group_name: None,
        }
    }

    #[test]
    fn reference_set_dedups_by_id() {
        let mut refs = ReferenceSet::new();
        refs.insert("sg-1", Some("web"));
        refs.insert("sg-1", Some("web"));
        refs.insert("sg-1", None);
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("sg-1"));
    }

    #[test]
    fn first_non_empty_name_wins() {
        let mut refs = ReferenceSet::new();
        refs.insert("sg-1", None);
        refs.insert("sg-1", Some("web"));
        refs.insert("sg-1", Some("other"));
        assert_eq!(refs.name_of("sg-1"), Some("web"));

        // Empty string counts as absent
        let mut refs = ReferenceSet::new();
        refs.insert("sg-2", Some(""));
        refs.insert("sg-2", Some("db"));
        assert_eq!(refs.name_of("sg-2"), Some("db"));
    }

    #[test]
    fn absorb_preserves_existing_names() {
        let mut a = ReferenceSet::new();
        a.insert("sg-1", Some("web"));
        let mut b = ReferenceSet::new();
        b.insert("sg-1", Some("late"));
        b.insert("sg-2", None);
        a.absorb(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.name_of("sg-1"), Some("web"));
        assert_eq!(a.name_of("sg-2"), None);
    }

    #[test]
    fn watch_list_removal_by_region_and_membership() {
        let mut list: WatchList = vec![
            entry("us-east-1", "sg-1"),
            entry("us-east-1", "sg-2"),
            entry("eu-west-1", "sg-1"),
        ]
        .into_iter()
        .collect();

        let mut refs = ReferenceSet::new();
        refs.insert("sg-1", None);

        let dropped = list.remove_in_use("us-east-1", &refs);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].group_id, "sg-1");

        // The same id in another region is untouched
        assert!(list.contains("eu-west-1", "sg-1"));
        assert!(list.contains("us-east-1", "sg-2"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn watch_list_regions_are_distinct() {
        let list: WatchList = vec![
            entry("us-east-1", "sg-1"),
            entry("us-east-1", "sg-2"),
            entry("eu-west-1", "sg-3"),
        ]
        .into_iter()
        .collect();
        let regions = list.regions();
        assert_eq!(regions.len(), 2);
        assert!(regions.contains("us-east-1"));
        assert!(regions.contains("eu-west-1"));
    }

    #[test]
    fn watch_list_entry_wire_format() {
        let named = WatchListEntry {
            region: "us-east-1".to_string(),
            group_id: "sg-2".to_string(),
            group_name: Some("db".to_string()),
        };
        let json = serde_json::to_value(&named).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"region": "us-east-1", "groupId": "sg-2", "groupName": "db"})
        );

        let unnamed = WatchListEntry {
            region: "us-east-1".to_string(),
            group_id: "sg-2".to_string(),
            group_name: None,
        };
        let json = serde_json::to_value(&unnamed).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"region": "us-east-1", "groupId": "sg-2"})
        );
    }
}
