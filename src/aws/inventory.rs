//! Security group inventory listing
//!
//! Lists every security group that exists in a region, with an opt-in
//! filter dropping groups named exactly `default`. Every default VPC
//! carries such a group; it cannot be deleted, so reporting it as unused
//! is true but actionable noise.

use super::error::{inventory_error, ScanError};
use super::InventoryClient;
use crate::types::SecurityGroupRef;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::{debug, warn};

/// Reserved name of the undeletable group in every default VPC.
pub const DEFAULT_GROUP_NAME: &str = "default";

impl InventoryClient {
    /// List all security groups in `region`.
    ///
    /// With `exclude_default` set, groups named exactly `"default"` are
    /// dropped from the result.
    pub async fn list_security_groups(
        &self,
        region: &str,
        exclude_default: bool,
    ) -> Result<Vec<SecurityGroupRef>, ScanError> {
        let client = self.ctx.ec2_client(region);

        let groups = (|| async {
            let mut groups = Vec::new();
            let mut pages = client.describe_security_groups().into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| inventory_error(region, e))?;
                for sg in page.security_groups() {
                    if let Some(id) = sg.group_id() {
                        groups.push(SecurityGroupRef::new(id, sg.group_name()));
                    }
                }
            }
            Ok(groups)
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(1))
                .with_max_delay(Duration::from_secs(30))
                .with_max_times(4),
        )
        .when(|e: &ScanError| e.is_throttling())
        .notify(|e, dur| {
            warn!(region = %region, delay = ?dur, error = %e, "Security group listing throttled, retrying...");
        })
        .await?;

        let groups = filter_default(groups, exclude_default);
        debug!(region = %region, count = groups.len(), "Listed security groups");
        Ok(groups)
    }
}

/// Drop groups named exactly `"default"` when `exclude_default` is set.
pub(crate) fn filter_default(
    groups: Vec<SecurityGroupRef>,
    exclude_default: bool,
) -> Vec<SecurityGroupRef> {
    if !exclude_default {
        return groups;
    }
    groups
        .into_iter()
        .filter(|g| g.group_name.as_deref() != Some(DEFAULT_GROUP_NAME))
        .collect()
}
