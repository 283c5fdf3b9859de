use chrono::Local;
use clap::Parser;

use crate::{
    cli::device::{DeviceArgs, StateArgs},
    prelude::*,
    tables::{build_device_table, build_sensor_table},
};

#[derive(Parser)]
pub struct SnapshotArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    #[clap(flatten)]
    state: StateArgs,
}

impl SnapshotArgs {
    pub async fn run(self) -> Result {
        let mut coordinator = self.device.coordinator(self.state.load()?.seeds())?;
        let update = coordinator.poll(Local::now()).await?;
        println!("{}", build_device_table(&update.device));
        println!("{}", build_sensor_table(coordinator.host(), &update));
        Ok(())
    }
}
