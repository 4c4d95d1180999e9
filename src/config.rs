//! Run configuration and defaults

use crate::aws::error::ScanError;
use std::time::Duration;

/// Default total run duration in minutes
pub const DEFAULT_RUN_MINUTES: u64 = 60;

/// Default resample interval in minutes
pub const DEFAULT_INTERVAL_MINUTES: u64 = 10;

/// Validated configuration for one tracking run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// AWS credentials profile
    pub profile: String,
    /// Total run duration; the snapshot is written when this expires
    pub run_duration: Duration,
    /// Interval between resample ticks
    pub resample_interval: Duration,
    /// Print the full watch list after every tick
    pub verbose: bool,
    /// Drop groups named exactly "default" from the inventory
    pub exclude_default: bool,
    /// Explicit region list; `None` means all enabled regions
    pub regions: Option<Vec<String>>,
}

impl RunConfig {
    /// Build and validate a config from raw CLI input.
    pub fn from_cli(
        profile: Option<String>,
        time_minutes: u64,
        interval_minutes: u64,
        verbose: bool,
        exclude_default: bool,
        regions: Option<&str>,
    ) -> Result<Self, ScanError> {
        let profile = profile.ok_or_else(|| {
            ScanError::Config(
                "missing AWS profile; supply one from your credentials file with -p/--profile"
                    .to_string(),
            )
        })?;
        // The docs use "default" as a placeholder; an explicit profile is required
        if profile == "default" {
            return Err(ScanError::Config(
                "replace the placeholder \"default\" with a profile from your AWS credentials file"
                    .to_string(),
            ));
        }
        if time_minutes == 0 {
            return Err(ScanError::Config(
                "run duration must be at least one minute".to_string(),
            ));
        }
        if interval_minutes == 0 {
            return Err(ScanError::Config(
                "resample interval must be at least one minute".to_string(),
            ));
        }

        let regions = regions.map(parse_region_list);
        if let Some(regions) = &regions {
            if regions.is_empty() {
                return Err(ScanError::Config(
                    "--regions was supplied but contains no region names".to_string(),
                ));
            }
        }

        Ok(Self {
            profile,
            run_duration: Duration::from_secs(time_minutes.saturating_mul(60)),
            resample_interval: Duration::from_secs(interval_minutes.saturating_mul(60)),
            verbose,
            exclude_default,
            regions,
        })
    }
}

/// Parse a comma-separated region list, trimming blanks.
fn parse_region_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
