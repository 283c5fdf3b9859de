use clap::{Parser, ValueEnum};

use crate::{
    api::imeon::{InstantKind, MonitorRange},
    cli::device::DeviceArgs,
    payload::normalize,
    prelude::*,
};

#[derive(Copy, Clone, ValueEnum)]
enum Endpoint {
    Data,
    Scan,
    Status,
    Energy,
    Monitor,
}

#[derive(Parser)]
pub struct ProbeArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    endpoint: Endpoint,

    /// Aggregation range of the monitor endpoint.
    #[clap(long, default_value = "hour")]
    range: MonitorRange,
}

impl ProbeArgs {
    pub async fn run(self) -> Result {
        let client = self.device.client()?;
        client.login(&self.device.username, &self.device.password).await?;
        let response = match self.endpoint {
            Endpoint::Data => client.fetch_instant(InstantKind::Primary).await?,
            Endpoint::Scan => client.fetch_instant(InstantKind::Scan).await?,
            Endpoint::Status => client.fetch_instant(InstantKind::Status).await?,
            Endpoint::Energy => client.fetch_energy().await?,
            Endpoint::Monitor => client.fetch_monitor(self.range).await?,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        let sample = normalize(&response);
        info!(n_fields = sample.len(), "normalized");
        println!("{}", serde_json::to_string_pretty(&sample)?);
        Ok(())
    }
}
