use std::{pin::pin, time::Duration};

use chrono::Local;
use clap::Parser;
use tokio::{
    select,
    signal,
    time::{MissedTickBehavior, interval},
};

use crate::{
    cli::{
        device::{DeviceArgs, StateArgs},
        parse_scan_interval,
    },
    coordinator::Update,
    prelude::*,
    tables::build_sensor_table,
};

#[derive(Parser)]
pub struct PollArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    #[clap(flatten)]
    state: StateArgs,

    /// Polling interval, between 10 seconds and 5 minutes.
    #[clap(
        long,
        env = "IMEON_SCAN_INTERVAL",
        default_value = "30s",
        value_parser = parse_scan_interval,
    )]
    pub scan_interval: Duration,

    /// Print the sensor table on every update instead of logging the values.
    #[clap(long)]
    table: bool,
}

impl PollArgs {
    pub async fn run(self) -> Result {
        let mut state = self.state.load()?;
        let mut coordinator = self.device.coordinator(state.seeds())?;
        let mut shutdown = pin!(shutdown_signal());

        let mut interval = interval(self.scan_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                _ = interval.tick() => {}
                result = &mut shutdown => {
                    result?;
                    info!("stopping…");
                    break;
                }
            }
            match coordinator.poll(Local::now()).await {
                Ok(update) => {
                    self.report(coordinator.host(), &update);
                    state.update(&update.energy);
                    self.state.save(&state)?;
                }
                Err(error) => error!("failed to update: {error}"),
            }
        }
        Ok(())
    }

    fn report(&self, host: &str, update: &Update) {
        if self.table {
            println!("{}", build_sensor_table(host, update));
            return;
        }
        let metrics = &update.metrics;
        info!(
            grid = %metrics.grid_power,
            solar = %metrics.solar_power,
            battery = %metrics.battery_power,
            home = %metrics.home_power,
            soc = %metrics.battery_soc,
            "updated"
        );
        for (sensor, reading) in &update.energy {
            debug!(
                sensor = %sensor.display_name(host),
                icon = sensor.icon(),
                total = %reading.total,
                power = %reading.power,
                "energy"
            );
        }
    }
}

/// Resolve on Ctrl-C or, on Unix, on `SIGTERM`.
async fn shutdown_signal() -> Result {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        select! {
            result = signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    signal::ctrl_c().await?;
    Ok(())
}
