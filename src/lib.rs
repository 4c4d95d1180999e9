//! sg-watch - tracks unused EC2 security groups across AWS regions
//!
//! This crate scans every enabled region for security groups that are not
//! attached to any resource, keeps the resulting watch list under periodic
//! re-verification, and writes a JSON snapshot when the run ends.

pub mod aws;
pub mod config;
pub mod coordinator;
pub mod maintainer;
pub mod scanner;
pub mod snapshot;
pub mod types;

#[cfg(test)]
pub mod testing;
