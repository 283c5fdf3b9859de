use serde::Serialize;

use crate::{metrics::alias, payload::Sample, quantity::energy::KilowattHours};

/// Cumulative energy counters reported by the device itself, zero when not reported.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Serialize)]
pub struct EnergyReport {
    pub grid_energy_import: KilowattHours,
    pub grid_energy_export: KilowattHours,
    pub solar_energy: KilowattHours,
    pub battery_energy_charged: KilowattHours,
    pub battery_energy_discharged: KilowattHours,
}

impl EnergyReport {
    pub fn derive(sample: &Sample) -> Self {
        let resolve =
            |aliases: alias::Aliases| KilowattHours(aliases.resolve(sample).unwrap_or_default());
        Self {
            grid_energy_import: resolve(alias::GRID_ENERGY_IMPORT),
            grid_energy_export: resolve(alias::GRID_ENERGY_EXPORT),
            solar_energy: resolve(alias::SOLAR_ENERGY),
            battery_energy_charged: resolve(alias::BATTERY_ENERGY_CHARGED),
            battery_energy_discharged: resolve(alias::BATTERY_ENERGY_DISCHARGED),
        }
    }
}
