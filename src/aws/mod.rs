//! AWS client modules
//!
//! This module wraps the AWS SDK clients used to inventory security groups:
//! - EC2: security groups, instances, network interfaces, VPC endpoints
//! - ELB / ELBv2: classic and v2 load balancers
//! - RDS: DB security groups referencing EC2 groups
//! - Lambda: function VPC configurations

pub mod collector;
pub mod context;
pub mod error;
pub mod inventory;
pub mod ops;

pub use context::AwsContext;
pub use error::ScanError;
pub use ops::InventoryOps;

/// Client for inventorying security groups and the resources that use them.
///
/// Region is an explicit parameter on every call; the context only carries
/// credentials and shared SDK configuration.
pub struct InventoryClient {
    pub(crate) ctx: AwsContext,
}

impl InventoryClient {
    /// Create a new client, loading AWS config from the environment.
    pub async fn new(profile: Option<&str>) -> Self {
        Self::from_context(&AwsContext::new(profile).await)
    }

    /// Create a client from a pre-loaded AWS context.
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self { ctx: ctx.clone() }
    }
}
