use std::{collections::BTreeMap, fmt::Debug, fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_with::{MapSkipError, serde_as};

use crate::{
    coordinator::EnergyReading,
    prelude::*,
    quantity::energy::KilowattHours,
    sensor::EnergySensor,
};

/// Energy totals persisted between the runs, keyed by the sensor ID.
#[serde_as]
#[derive(Default, Serialize, Deserialize)]
pub struct EnergyState {
    #[serde_as(deserialize_as = "MapSkipError<_, _>")]
    #[serde(default)]
    totals: BTreeMap<String, KilowattHours>,
}

impl EnergyState {
    #[instrument(name = "reading the energy state…")]
    pub fn load<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            info!("no saved energy state, starting from zero");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse `{}`", path.display()))
    }

    #[instrument(skip(self), name = "writing the energy state…")]
    pub fn save<P: AsRef<Path> + Debug>(&self, path: P) -> Result {
        let path = path.as_ref();
        fs::write(path, toml::to_string(self)?)
            .with_context(|| format!("failed to write `{}`", path.display()))
    }

    /// Restored totals of the known sensors.
    #[must_use]
    pub fn seeds(&self) -> BTreeMap<EnergySensor, KilowattHours> {
        self.totals
            .iter()
            .filter_map(|(id, total)| Some((EnergySensor::from_id(id)?, *total)))
            .collect()
    }

    pub fn update(&mut self, energy: &BTreeMap<EnergySensor, EnergyReading>) {
        for (sensor, reading) in energy {
            self.totals.insert(sensor.id().to_owned(), reading.total);
        }
    }
}
