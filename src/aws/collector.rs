//! Reference collection: which security groups are in use in a region
//!
//! Queries every resource kind that can hold a security group attachment and
//! merges the results into one deduplicated `ReferenceSet`. Any failing
//! source fails the whole collection: an incomplete reference set would make
//! a used group look unused, which is the one result this tool must never
//! produce.

use super::error::{collection_error, ScanError};
use super::InventoryClient;
use crate::types::ReferenceSet;
use aws_sdk_ec2::types::{Filter, Instance, NetworkInterface, VpcEndpoint};
use aws_sdk_elasticloadbalancing::types::LoadBalancerDescription;
use aws_sdk_elasticloadbalancingv2::types::LoadBalancer;
use aws_sdk_lambda::types::FunctionConfiguration;
use aws_sdk_rds::types::DbSecurityGroup;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff for throttled describe/list calls.
fn throttle_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(30))
        .with_max_times(4)
}

impl InventoryClient {
    /// Collect every security group referenced by any resource in `region`.
    ///
    /// The per-kind queries are independent reads and run concurrently.
    /// Fails fast if any of them fails.
    pub async fn collect_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        let (instances, interfaces, endpoints, classic_lbs, v2_lbs, db_groups, functions) = tokio::join!(
            self.instance_references(region),
            self.network_interface_references(region),
            self.vpc_endpoint_references(region),
            self.classic_load_balancer_references(region),
            self.load_balancer_references(region),
            self.db_security_group_references(region),
            self.function_references(region),
        );

        let mut refs = ReferenceSet::new();
        for part in [
            instances?,
            interfaces?,
            endpoints?,
            classic_lbs?,
            v2_lbs?,
            db_groups?,
            functions?,
        ] {
            refs.absorb(part);
        }

        debug!(region = %region, count = refs.len(), "Collected security group references");
        Ok(refs)
    }

    /// Groups attached to EC2 instances, both directly and through each
    /// instance's network interfaces.
    async fn instance_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        let client = self.ctx.ec2_client(region);

        // Terminated instances no longer hold their attachments
        let state_filter = Filter::builder()
            .name("instance-state-name")
            .values("pending")
            .values("running")
            .values("shutting-down")
            .values("stopping")
            .values("stopped")
            .build();

        (|| async {
            let mut refs = ReferenceSet::new();
            let mut pages = client
                .describe_instances()
                .filters(state_filter.clone())
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| collection_error(region, "EC2 instance", e))?;
                for reservation in page.reservations() {
                    refs_from_instances(reservation.instances(), &mut refs);
                }
            }
            Ok(refs)
        })
        .retry(throttle_backoff())
        .when(|e: &ScanError| e.is_throttling())
        .notify(|e, dur| {
            warn!(region = %region, delay = ?dur, error = %e, "EC2 instance query throttled, retrying...");
        })
        .await
    }

    /// Groups attached to network interfaces, queried independently of
    /// instances. Catches orphaned ENIs that still hold a group.
    async fn network_interface_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        let client = self.ctx.ec2_client(region);

        (|| async {
            let mut refs = ReferenceSet::new();
            let mut pages = client.describe_network_interfaces().into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| collection_error(region, "network interface", e))?;
                refs_from_network_interfaces(page.network_interfaces(), &mut refs);
            }
            Ok(refs)
        })
        .retry(throttle_backoff())
        .when(|e: &ScanError| e.is_throttling())
        .notify(|e, dur| {
            warn!(region = %region, delay = ?dur, error = %e, "Network interface query throttled, retrying...");
        })
        .await
    }

    /// Groups attached to VPC endpoints.
    async fn vpc_endpoint_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        let client = self.ctx.ec2_client(region);

        (|| async {
            let mut refs = ReferenceSet::new();
            let mut pages = client.describe_vpc_endpoints().into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| collection_error(region, "VPC endpoint", e))?;
                refs_from_vpc_endpoints(page.vpc_endpoints(), &mut refs);
            }
            Ok(refs)
        })
        .retry(throttle_backoff())
        .when(|e: &ScanError| e.is_throttling())
        .notify(|e, dur| {
            warn!(region = %region, delay = ?dur, error = %e, "VPC endpoint query throttled, retrying...");
        })
        .await
    }

    /// Groups attached to classic load balancers. These report a flat list
    /// of bare group ids, unlike the v2 API.
    async fn classic_load_balancer_references(
        &self,
        region: &str,
    ) -> Result<ReferenceSet, ScanError> {
        let client = self.ctx.elb_client(region);

        (|| async {
            let mut refs = ReferenceSet::new();
            let mut pages = client.describe_load_balancers().into_paginator().send();
            while let Some(page) = pages.next().await {
                let page =
                    page.map_err(|e| collection_error(region, "classic load balancer", e))?;
                refs_from_classic_load_balancers(page.load_balancer_descriptions(), &mut refs);
            }
            Ok(refs)
        })
        .retry(throttle_backoff())
        .when(|e: &ScanError| e.is_throttling())
        .notify(|e, dur| {
            warn!(region = %region, delay = ?dur, error = %e, "Classic ELB query throttled, retrying...");
        })
        .await
    }

    /// Groups attached to v2 (application/network) load balancers. Both
    /// load balancer generations coexist and must be merged.
    async fn load_balancer_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        let client = self.ctx.elbv2_client(region);

        (|| async {
            let mut refs = ReferenceSet::new();
            let mut pages = client.describe_load_balancers().into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| collection_error(region, "load balancer", e))?;
                refs_from_load_balancers(page.load_balancers(), &mut refs);
            }
            Ok(refs)
        })
        .retry(throttle_backoff())
        .when(|e: &ScanError| e.is_throttling())
        .notify(|e, dur| {
            warn!(region = %region, delay = ?dur, error = %e, "ELBv2 query throttled, retrying...");
        })
        .await
    }

    /// EC2 groups referenced through RDS DB security groups. One resource
    /// kind wrapping references to groups of another kind.
    async fn db_security_group_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        let client = self.ctx.rds_client(region);

        (|| async {
            let mut refs = ReferenceSet::new();
            let mut pages = client.describe_db_security_groups().into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| collection_error(region, "DB security group", e))?;
                refs_from_db_security_groups(page.db_security_groups(), &mut refs);
            }
            Ok(refs)
        })
        .retry(throttle_backoff())
        .when(|e: &ScanError| e.is_throttling())
        .notify(|e, dur| {
            warn!(region = %region, delay = ?dur, error = %e, "RDS query throttled, retrying...");
        })
        .await
    }

    /// Groups referenced by Lambda function VPC configurations. Functions
    /// without VPC config contribute nothing.
    async fn function_references(&self, region: &str) -> Result<ReferenceSet, ScanError> {
        let client = self.ctx.lambda_client(region);

        (|| async {
            let mut refs = ReferenceSet::new();
            let mut pages = client.list_functions().into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| collection_error(region, "Lambda function", e))?;
                refs_from_functions(page.functions(), &mut refs);
            }
            Ok(refs)
        })
        .retry(throttle_backoff())
        .when(|e: &ScanError| e.is_throttling())
        .notify(|e, dur| {
            warn!(region = %region, delay = ?dur, error = %e, "Lambda query throttled, retrying...");
        })
        .await
    }
}

/// Extract group references from EC2 instances.
///
/// Each instance has two independent sources: its directly attached groups
/// and the groups of each of its network interfaces. These are not assumed
/// to be the same set.
fn refs_from_instances(instances: &[Instance], refs: &mut ReferenceSet) {
    for instance in instances {
        for group in instance.security_groups() {
            if let Some(id) = group.group_id() {
                refs.insert(id, group.group_name());
            }
        }
        for interface in instance.network_interfaces() {
            for group in interface.groups() {
                if let Some(id) = group.group_id() {
                    refs.insert(id, group.group_name());
                }
            }
        }
    }
}

/// Extract group references from standalone network interfaces.
fn refs_from_network_interfaces(interfaces: &[NetworkInterface], refs: &mut ReferenceSet) {
    for interface in interfaces {
        for group in interface.groups() {
            if let Some(id) = group.group_id() {
                refs.insert(id, group.group_name());
            }
        }
    }
}

/// Extract group references from VPC endpoints.
fn refs_from_vpc_endpoints(endpoints: &[VpcEndpoint], refs: &mut ReferenceSet) {
    for endpoint in endpoints {
        for group in endpoint.groups() {
            if let Some(id) = group.group_id() {
                refs.insert(id, group.group_name());
            }
        }
    }
}

/// Extract group references from classic load balancers (bare id list).
fn refs_from_classic_load_balancers(
    descriptions: &[LoadBalancerDescription],
    refs: &mut ReferenceSet,
) {
    for description in descriptions {
        for group_id in description.security_groups() {
            refs.insert(group_id, None);
        }
    }
}

/// Extract group references from v2 load balancers (bare id list, nested
/// under a differently shaped response than the classic API).
fn refs_from_load_balancers(balancers: &[LoadBalancer], refs: &mut ReferenceSet) {
    for balancer in balancers {
        for group_id in balancer.security_groups() {
            refs.insert(group_id, None);
        }
    }
}

/// Extract EC2 group references nested inside RDS DB security groups.
fn refs_from_db_security_groups(groups: &[DbSecurityGroup], refs: &mut ReferenceSet) {
    for db_group in groups {
        for ec2_group in db_group.ec2_security_groups() {
            if let Some(id) = ec2_group.ec2_security_group_id() {
                refs.insert(id, ec2_group.ec2_security_group_name());
            }
        }
    }
}

/// Extract group references from Lambda function VPC configs. Absent
/// config means zero references, not an error.
fn refs_from_functions(functions: &[FunctionConfiguration], refs: &mut ReferenceSet) {
    for function in functions {
        if let Some(vpc_config) = function.vpc_config() {
            for group_id in vpc_config.security_group_ids() {
                refs.insert(group_id, None);
            }
        }
    }
}
