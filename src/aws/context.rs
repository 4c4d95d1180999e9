//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once and
//! creating per-region service clients from the same config.

use anyhow::{Context, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;
use tracing::debug;

/// Region used only to bootstrap `DescribeRegions` when the selected
/// profile carries no region of its own.
const BOOTSTRAP_REGION: &str = "us-west-2";

/// Shared AWS configuration context for creating service clients.
///
/// The config (credentials, profile) is loaded once; every client is built
/// for an explicitly supplied region, so no call depends on ambient region
/// state.
///
/// # Example
/// ```ignore
/// let aws = AwsContext::new(Some("dev")).await;
/// let ec2 = aws.ec2_client("us-east-1");
/// let rds = aws.rds_client("eu-west-1");
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
}

impl AwsContext {
    /// Load AWS configuration, optionally selecting a credentials profile.
    ///
    /// Credentials and other SDK settings come from the environment, config
    /// files, and IAM roles, as usual.
    pub async fn new(profile: Option<&str>) -> Self {
        let region_provider = RegionProviderChain::default_provider().or_else(BOOTSTRAP_REGION);
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        Self {
            config: Arc::new(config),
        }
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// List all regions enabled for this account.
    pub async fn list_regions(&self) -> Result<Vec<String>> {
        let client = aws_sdk_ec2::Client::new(self.sdk_config());
        let response = client
            .describe_regions()
            .send()
            .await
            .context("Failed to describe regions")?;

        let regions: Vec<String> = response
            .regions()
            .iter()
            .filter_map(|r| r.region_name().map(str::to_string))
            .collect();

        debug!(count = regions.len(), "Listed enabled regions");
        Ok(regions)
    }

    /// Create an EC2 client for the given region.
    pub fn ec2_client(&self, region: &str) -> aws_sdk_ec2::Client {
        let conf = aws_sdk_ec2::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_ec2::Client::from_conf(conf)
    }

    /// Create a classic ELB client for the given region.
    pub fn elb_client(&self, region: &str) -> aws_sdk_elasticloadbalancing::Client {
        let conf = aws_sdk_elasticloadbalancing::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_elasticloadbalancing::Client::from_conf(conf)
    }

    /// Create an ELBv2 (ALB/NLB) client for the given region.
    pub fn elbv2_client(&self, region: &str) -> aws_sdk_elasticloadbalancingv2::Client {
        let conf = aws_sdk_elasticloadbalancingv2::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_elasticloadbalancingv2::Client::from_conf(conf)
    }

    /// Create an RDS client for the given region.
    pub fn rds_client(&self, region: &str) -> aws_sdk_rds::Client {
        let conf = aws_sdk_rds::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_rds::Client::from_conf(conf)
    }

    /// Create a Lambda client for the given region.
    pub fn lambda_client(&self, region: &str) -> aws_sdk_lambda::Client {
        let conf = aws_sdk_lambda::config::Builder::from(self.sdk_config())
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_lambda::Client::from_conf(conf)
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require AWS credentials and are skipped in regular runs

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn context_creation_and_clone() {
        let ctx = AwsContext::new(None).await;
        let ctx2 = ctx.clone();

        // Both point at the same Arc'd config
        assert!(Arc::ptr_eq(&ctx.config, &ctx2.config));
    }
}
