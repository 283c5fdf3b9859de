//! One poll cycle against a single inverter.

mod device;

use std::collections::BTreeMap;

use bon::bon;
use chrono::{DateTime, Local};
use serde_json::Value;

pub use self::device::DeviceInfo;
use crate::{
    api::imeon::{Client, Error, InstantKind, Result},
    history::ScanHistory,
    integrator::EnergyIntegrator,
    metrics::{EnergyReport, MetricSet},
    payload::{Sample, normalize},
    prelude::{debug, instrument, warn},
    quantity::{energy::KilowattHours, power::Watts},
    sensor::EnergySensor,
};

/// Result of a successful poll cycle.
#[derive(Clone, Debug)]
pub struct Update {
    pub metrics: MetricSet,
    pub energy: BTreeMap<EnergySensor, EnergyReading>,
    pub device: DeviceInfo,
}

#[derive(Copy, Clone, Debug)]
pub struct EnergyReading {
    pub total: KilowattHours,
    pub power: Watts,
}

/// Owns the client and all the state carried between the cycles of one device.
pub struct Coordinator {
    client: Client,
    username: String,
    password: String,
    logged_in: bool,
    history: ScanHistory,
    integrators: BTreeMap<EnergySensor, EnergyIntegrator>,
    device: DeviceInfo,
}

#[bon]
impl Coordinator {
    #[builder]
    pub fn new(
        client: Client,
        #[builder(into)] username: String,
        #[builder(into)] password: String,
        #[builder(default)] seeds: BTreeMap<EnergySensor, KilowattHours>,
    ) -> Self {
        let integrators = EnergySensor::all()
            .iter()
            .map(|sensor| (sensor, EnergyIntegrator::seeded(seeds.get(&sensor).copied())))
            .collect();
        Self {
            client,
            username,
            password,
            logged_in: false,
            history: ScanHistory::default(),
            integrators,
            device: DeviceInfo::default(),
        }
    }

    pub fn host(&self) -> &str {
        self.client.host()
    }

    /// Run a poll cycle, repeating it once after a forced re-login should it fail.
    #[instrument(skip_all, fields(base_url = self.client.base_url()))]
    pub async fn poll(&mut self, now: DateTime<Local>) -> Result<Update> {
        match self.try_poll(now).await {
            Ok(update) => Ok(update),
            Err(error) => {
                warn!("failed to poll, retrying with a fresh login: {error}");
                self.logged_in = false;
                self.try_poll(now).await.map_err(|error| Error::UpdateFailed(Box::new(error)))
            }
        }
    }

    async fn try_poll(&mut self, now: DateTime<Local>) -> Result<Update> {
        if !self.logged_in {
            self.client.login(&self.username, &self.password).await?;
            self.logged_in = true;
        }
        let data = normalize(&self.client.fetch_instant(InstantKind::Primary).await?);
        let scan = soft(self.client.fetch_instant(InstantKind::Scan).await, "scan");
        let energy = soft(self.client.fetch_energy().await, "energy");

        let n_added = self.history.ingest(&scan, now);
        debug!(n_added, n_total = self.history.len(), "ingested the scan entries");
        self.device = DeviceInfo::extract(&data);

        let sample = self.current_sample(data, &scan);
        let reported = EnergyReport::derive(&normalize(&energy));
        let metrics = MetricSet::derive(&sample).with_reported(reported);
        let energy = self
            .integrators
            .iter_mut()
            .map(|(sensor, integrator)| {
                let total =
                    integrator.tick(sensor.power(&metrics), now, sensor.reported(&metrics.reported));
                (*sensor, EnergyReading { total, power: integrator.last_power() })
            })
            .collect();
        Ok(Update { metrics, energy, device: self.device.clone() })
    }

    /// The freshest scan entry, or the instant snapshot overlaid with the scan response.
    fn current_sample(&self, mut data: Sample, scan: &Value) -> Sample {
        if let Some(entry) = self.history.latest() {
            return entry.sample.clone();
        }
        data.extend(normalize(scan));
        data
    }
}

/// Unwrap an optional endpoint response, treating failures as an empty response.
fn soft(result: Result<Value>, endpoint: &str) -> Value {
    result.unwrap_or_else(|error| {
        debug!(endpoint, "ignoring the failed request: {error}");
        Value::Null
    })
}
