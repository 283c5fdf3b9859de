mod device;
mod poll;
mod probe;
mod snapshot;

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::{
    cli::{poll::PollArgs, probe::ProbeArgs, snapshot::SnapshotArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub async fn run(self) -> Result {
        match self.command {
            Command::Poll(args) => args.run().await,
            Command::Probe(args) => args.run().await,
            Command::Snapshot(args) => args.run().await,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: poll the inverter and keep the energy totals.
    #[clap(name = "poll")]
    Poll(Box<PollArgs>),

    /// Fetch a single endpoint and print the raw and normalized responses.
    #[clap(name = "probe")]
    Probe(Box<ProbeArgs>),

    /// Run a single poll cycle and print the sensors.
    #[clap(name = "snapshot")]
    Snapshot(Box<SnapshotArgs>),
}

const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(10);
const MAX_SCAN_INTERVAL: Duration = Duration::from_secs(300);

fn parse_scan_interval(value: &str) -> Result<Duration> {
    let interval: Duration = value.parse::<humantime::Duration>()?.into();
    ensure!(
        (MIN_SCAN_INTERVAL..=MAX_SCAN_INTERVAL).contains(&interval),
        "scan interval must be between {} and {}",
        humantime::format_duration(MIN_SCAN_INTERVAL),
        humantime::format_duration(MAX_SCAN_INTERVAL),
    );
    Ok(interval)
}
