//! Scan error taxonomy and AWS error classification
//!
//! Uses the SDK's `.code()` method via `ProvideErrorMetadata` instead of
//! string matching on Debug format.

use aws_sdk_ec2::error::ProvideErrorMetadata;
use thiserror::Error;

/// Errors raised while inventorying security groups.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A reference-source query failed. Never swallowed into an empty set:
    /// a missing source would misreport used groups as unused.
    #[error("failed to collect {kind} references in {region}: {message}")]
    Collection {
        region: String,
        kind: &'static str,
        code: Option<String>,
        message: String,
    },

    /// Listing the security groups of a region failed.
    #[error("failed to list security groups in {region}: {message}")]
    Inventory {
        region: String,
        code: Option<String>,
        message: String,
    },

    /// A whole-region scan failed (wraps a collection or inventory error).
    #[error("scan failed for region {region}")]
    Region {
        region: String,
        #[source]
        source: Box<ScanError>,
    },

    /// Bad or missing CLI input.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

impl ScanError {
    /// Whether this error came from API rate limiting and is worth retrying.
    pub fn is_throttling(&self) -> bool {
        let code = match self {
            ScanError::Collection { code, .. } | ScanError::Inventory { code, .. } => code,
            ScanError::Region { source, .. } => return source.is_throttling(),
            ScanError::Config(_) => return false,
        };
        matches!(code.as_deref(), Some(c) if THROTTLING_CODES.contains(&c))
    }

    /// The region this error is scoped to, if any.
    pub fn region(&self) -> Option<&str> {
        match self {
            ScanError::Collection { region, .. }
            | ScanError::Inventory { region, .. }
            | ScanError::Region { region, .. } => Some(region),
            ScanError::Config(_) => None,
        }
    }
}

/// Build a `Collection` error from an AWS SDK error, preserving the
/// service error code for retry classification.
pub fn collection_error<E>(region: &str, kind: &'static str, err: E) -> ScanError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    ScanError::Collection {
        region: region.to_string(),
        kind,
        code: err.code().map(str::to_string),
        message: err
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string()),
    }
}

/// Build an `Inventory` error from an AWS SDK error.
pub fn inventory_error<E>(region: &str, err: E) -> ScanError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    ScanError::Inventory {
        region: region.to_string(),
        code: err.code().map(str::to_string),
        message: err
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string()),
    }
}
