//! sg-watch: unused security group tracker
//!
//! Scans every enabled region for security groups not attached to any
//! resource, re-verifies the findings on an interval, and writes the final
//! watch list to `unused_security_groups.json` when the run ends.

use anyhow::{Context, Result};
use clap::Parser;
use sg_watch::aws::{AwsContext, InventoryClient};
use sg_watch::config::{RunConfig, DEFAULT_INTERVAL_MINUTES, DEFAULT_RUN_MINUTES};
use sg_watch::maintainer::WatchListMaintainer;
use sg_watch::{coordinator, snapshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sg-watch")]
#[command(about = "Collects unused EC2 security groups across regions")]
#[command(version)]
struct Args {
    /// AWS profile to use, as defined in the AWS credentials file
    #[arg(short, long)]
    profile: Option<String>,

    /// Total run duration in minutes
    #[arg(short = 't', long = "time", default_value_t = DEFAULT_RUN_MINUTES)]
    time: u64,

    /// Resample interval in minutes
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_MINUTES)]
    interval: u64,

    /// Print the full watch list after every resample tick
    #[arg(short, long)]
    verbose: bool,

    /// Exclude groups named "default" (the undeletable default-VPC groups)
    #[arg(long)]
    exclude_default: bool,

    /// Comma-separated regions to scan (default: all enabled regions)
    #[arg(long)]
    regions: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = RunConfig::from_cli(
        args.profile,
        args.time,
        args.interval,
        args.verbose,
        args.exclude_default,
        args.regions.as_deref(),
    )?;

    if config.resample_interval >= config.run_duration {
        warn!(
            interval_mins = args.interval,
            time_mins = args.time,
            "Resample interval is not shorter than the run duration, no resampling will occur"
        );
    }

    info!(profile = %config.profile, "Using AWS profile");
    let ctx = AwsContext::new(Some(&config.profile)).await;
    let client = InventoryClient::from_context(&ctx);

    let regions = match &config.regions {
        Some(regions) => regions.clone(),
        None => ctx.list_regions().await?,
    };

    let outcome = coordinator::scan_all_regions(&client, &regions, config.exclude_default).await;
    let watch_list = outcome.into_watch_list();

    let mut maintainer = WatchListMaintainer::new(client, watch_list, config.verbose);

    // The run-duration deadline cancels the resample timer; the snapshot is
    // taken only after the loop has stopped.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        let run_duration = config.run_duration;
        tokio::spawn(async move {
            tokio::time::sleep(run_duration).await;
            cancel.cancel();
        });
    }

    maintainer.run(config.resample_interval, cancel).await;

    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let path = snapshot::write_snapshot(maintainer.watch_list(), &cwd)?;

    info!(
        path = %path.display(),
        time_mins = args.time,
        interval_mins = args.interval,
        "Unused security groups tracked, snapshot written"
    );
    Ok(())
}
