//! Regional scan: inventory minus references
//!
//! Pure with respect to shared state: the result is a function of the two
//! point-in-time snapshots it combines.

use crate::aws::error::ScanError;
use crate::aws::InventoryOps;
use crate::types::SecurityGroupRef;
use tracing::debug;

/// Compute the unused security groups of one region.
///
/// Runs reference collection and inventory listing concurrently (they are
/// independent reads) and keeps every inventoried group whose id is absent
/// from the reference set. Membership is decided by group id only.
///
/// If either sub-query fails, the whole regional scan fails; a partial
/// result for a region could misreport used groups as unused.
pub async fn scan_region<C: InventoryOps>(
    ops: &C,
    region: &str,
    exclude_default: bool,
) -> Result<Vec<SecurityGroupRef>, ScanError> {
    let (references, inventory) = tokio::try_join!(
        ops.collect_references(region),
        ops.list_security_groups(region, exclude_default),
    )
    .map_err(|e| ScanError::Region {
        region: region.to_string(),
        source: Box::new(e),
    })?;

    let total = inventory.len();
    let unused: Vec<SecurityGroupRef> = inventory
        .into_iter()
        .filter(|group| !references.contains(&group.group_id))
        .collect();

    debug!(
        region = %region,
        total,
        referenced = references.len(),
        unused = unused.len(),
        "Regional scan complete"
    );
    Ok(unused)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sg, StubInventory};

    #[tokio::test]
    async fn unused_is_inventory_minus_references() {
        let stub = StubInventory::new().with_inventory(
            "us-east-1",
            vec![
                sg("sg-1", Some("web")),
                sg("sg-2", Some("db")),
                sg("sg-3", Some("default")),
            ],
        );
        stub.push_references("us-east-1", vec![sg("sg-1", Some("web"))]);

        let unused = scan_region(&stub, "us-east-1", true).await.unwrap();
        assert_eq!(unused, vec![sg("sg-2", Some("db"))]);
    }

    #[tokio::test]
    async fn default_group_reported_when_filter_off() {
        let stub = StubInventory::new().with_inventory(
            "us-east-1",
            vec![sg("sg-1", Some("web")), sg("sg-3", Some("default"))],
        );
        stub.push_references("us-east-1", vec![sg("sg-1", Some("web"))]);

        let unused = scan_region(&stub, "us-east-1", false).await.unwrap();
        assert_eq!(unused, vec![sg("sg-3", Some("default"))]);
    }

    #[tokio::test]
    async fn membership_is_by_id_not_name() {
        let stub = StubInventory::new()
            .with_inventory("us-east-1", vec![sg("sg-1", Some("renamed"))]);
        // Referenced under a different (missing) name: still in use
        stub.push_references("us-east-1", vec![sg("sg-1", None)]);

        let unused = scan_region(&stub, "us-east-1", false).await.unwrap();
        assert!(unused.is_empty());
    }

    #[tokio::test]
    async fn collection_failure_fails_the_region() {
        let stub =
            StubInventory::new().with_inventory("us-east-1", vec![sg("sg-1", Some("web"))]);
        stub.push_failure("us-east-1");

        let err = scan_region(&stub, "us-east-1", false).await.unwrap_err();
        assert!(matches!(err, ScanError::Region { ref region, .. } if region == "us-east-1"));
    }
}
