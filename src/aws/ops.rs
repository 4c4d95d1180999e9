//! Inventory operations trait for testing

use super::error::ScanError;
use super::InventoryClient;
use crate::types::{ReferenceSet, SecurityGroupRef};
use std::future::Future;

/// Trait for the per-region inventory operations that can be mocked in tests.
///
/// Abstracts the AWS calls so the scanner, coordinator, and watch list
/// maintainer can be unit tested without hitting real AWS.
pub trait InventoryOps: Send + Sync {
    /// Collect every security group referenced by any resource in `region`
    fn collect_references(
        &self,
        region: &str,
    ) -> impl Future<Output = Result<ReferenceSet, ScanError>> + Send;

    /// List all security groups in `region`, optionally without the
    /// default-VPC group
    fn list_security_groups(
        &self,
        region: &str,
        exclude_default: bool,
    ) -> impl Future<Output = Result<Vec<SecurityGroupRef>, ScanError>> + Send;
}

impl InventoryOps for InventoryClient {
    async fn collect_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        InventoryClient::collect_references(self, region).await
    }

    async fn list_security_groups(
        &self,
        region: &str,
        exclude_default: bool,
    ) -> Result<Vec<SecurityGroupRef>, ScanError> {
        InventoryClient::list_security_groups(self, region, exclude_default).await
    }
}
