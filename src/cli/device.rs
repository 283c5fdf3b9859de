use std::{collections::BTreeMap, path::PathBuf};

use clap::Parser;

use crate::{
    api::imeon::Client,
    coordinator::Coordinator,
    prelude::*,
    quantity::energy::KilowattHours,
    sensor::EnergySensor,
    state::EnergyState,
};

#[derive(Parser)]
pub struct DeviceArgs {
    /// Inverter host or IP address on the local network, for example: `192.168.1.50`.
    #[clap(long, env = "IMEON_HOST")]
    pub host: String,

    #[clap(long, env = "IMEON_USERNAME", default_value = "installer@local")]
    pub username: String,

    #[clap(long, env = "IMEON_PASSWORD", default_value = "Installer_P4SS", hide_env_values = true)]
    pub password: String,

    /// Timeout of each request.
    #[clap(long, env = "IMEON_TIMEOUT", default_value = "15s")]
    pub timeout: humantime::Duration,
}

impl DeviceArgs {
    pub fn client(&self) -> Result<Client> {
        Client::new(&self.host, self.timeout.into())
            .with_context(|| format!("failed to create a client for `{}`", self.host))
    }

    pub fn coordinator(&self, seeds: BTreeMap<EnergySensor, KilowattHours>) -> Result<Coordinator> {
        Ok(Coordinator::builder()
            .client(self.client()?)
            .username(&self.username)
            .password(&self.password)
            .seeds(seeds)
            .build())
    }
}

#[derive(Parser)]
pub struct StateArgs {
    /// TOML file with the energy totals carried over between the runs.
    #[clap(long = "state-path", env = "IMEON_STATE_PATH", default_value = "imeon-state.toml")]
    pub path: PathBuf,
}

impl StateArgs {
    pub fn load(&self) -> Result<EnergyState> {
        EnergyState::load(&self.path)
    }

    pub fn save(&self, state: &EnergyState) -> Result {
        state.save(&self.path)
    }
}
