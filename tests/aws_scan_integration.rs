//! AWS integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_scan_integration -- --ignored
//! ```

use sg_watch::aws::{AwsContext, InventoryClient};
use sg_watch::scanner::scan_region;

/// Region used for single-region integration tests
fn test_region() -> String {
    std::env::var("SG_WATCH_TEST_REGION").unwrap_or_else(|_| "us-east-1".to_string())
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn list_regions_returns_enabled_regions() {
    let ctx = AwsContext::new(None).await;
    let regions = ctx
        .list_regions()
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");

    assert!(!regions.is_empty(), "expected at least one enabled region");
    assert!(
        regions.iter().all(|r| !r.is_empty()),
        "region names should be non-empty"
    );
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn inventory_contains_default_group_unless_excluded() {
    let region = test_region();
    let client = InventoryClient::new(None).await;

    let all = client
        .list_security_groups(&region, false)
        .await
        .expect("Should list security groups");
    let filtered = client
        .list_security_groups(&region, true)
        .await
        .expect("Should list security groups");

    assert!(filtered.len() <= all.len());
    assert!(
        filtered
            .iter()
            .all(|g| g.group_name.as_deref() != Some("default")),
        "filtered inventory must not contain the default group"
    );
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn unused_groups_are_disjoint_from_references() {
    let region = test_region();
    let client = InventoryClient::new(None).await;

    let references = client
        .collect_references(&region)
        .await
        .expect("Should collect references");
    let unused = scan_region(&client, &region, false)
        .await
        .expect("Should scan region");

    for group in &unused {
        assert!(
            !references.contains(&group.group_id),
            "unused group {} must not be referenced",
            group.group_id
        );
    }
}
