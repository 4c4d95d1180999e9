//! Final watch list snapshot
//!
//! Serializes the watch list to a JSON file once the run deadline fires.
//! Callers must only invoke this after the maintainer loop has stopped, so
//! the snapshot can never race a resample tick.

use crate::types::WatchList;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed output filename, written to the working directory.
pub const SNAPSHOT_FILENAME: &str = "unused_security_groups.json";

/// Write the watch list as a pretty-printed JSON array into `dir`.
///
/// Returns the path of the written file.
pub fn write_snapshot(watch_list: &WatchList, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(SNAPSHOT_FILENAME);
    let json =
        serde_json::to_string_pretty(watch_list).context("Failed to serialize watch list")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;

    info!(
        path = %path.display(),
        count = watch_list.len(),
        "Wrote unused security group snapshot"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{watch_entry, watch_list};

    #[test]
    fn writes_json_array_of_entries() {
        let dir = tempfile::tempdir().unwrap();
        let list = watch_list(vec![
            watch_entry("us-east-1", "sg-2", Some("db")),
            watch_entry("eu-west-1", "sg-9", None),
        ]);

        let path = write_snapshot(&list, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), SNAPSHOT_FILENAME);

        let contents = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"region": "us-east-1", "groupId": "sg-2", "groupName": "db"},
                {"region": "eu-west-1", "groupId": "sg-9"},
            ])
        );
    }

    #[test]
    fn empty_watch_list_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(&watch_list(vec![]), dir.path()).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "[]");
    }
}
