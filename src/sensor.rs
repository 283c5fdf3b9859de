//! Fixed catalog of the exposed sensors.

use std::fmt::{Display, Formatter};

use enumset::EnumSet;

use crate::{
    metrics::{EnergyReport, MetricSet},
    quantity::{energy::KilowattHours, power::Watts},
};

/// Cumulative energy sensor, total increasing in kilowatt-hours.
#[derive(Debug, Hash, PartialOrd, Ord, enumset::EnumSetType)]
pub enum EnergySensor {
    GridConsumption,
    GridReturn,
    SolarProduction,
    BatteryCharging,
    BatteryDischarging,
}

impl EnergySensor {
    #[must_use]
    pub fn all() -> EnumSet<Self> {
        EnumSet::all()
    }

    /// Stable identifier, also used as the key in the persisted state.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::GridConsumption => "grid_consumption",
            Self::GridReturn => "grid_return",
            Self::SolarProduction => "solar_production",
            Self::BatteryCharging => "battery_charging",
            Self::BatteryDischarging => "battery_discharging",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GridConsumption => "Grid Consumption",
            Self::GridReturn => "Grid Return",
            Self::SolarProduction => "Solar Production",
            Self::BatteryCharging => "Battery Charging",
            Self::BatteryDischarging => "Battery Discharging",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::GridConsumption => "mdi:transmission-tower",
            Self::GridReturn => "mdi:transmission-tower-export",
            Self::SolarProduction => "mdi:solar-power",
            Self::BatteryCharging => "mdi:battery-charging",
            Self::BatteryDischarging => "mdi:battery",
        }
    }

    /// Non-negative power this sensor integrates.
    #[must_use]
    pub const fn power(self, metrics: &MetricSet) -> Watts {
        match self {
            Self::GridConsumption => metrics.grid_consumption_power,
            Self::GridReturn => metrics.grid_return_power,
            Self::SolarProduction => metrics.solar_power,
            Self::BatteryCharging => metrics.battery_charging_power,
            Self::BatteryDischarging => metrics.battery_discharging_power,
        }
    }

    #[must_use]
    pub const fn reported(self, report: &EnergyReport) -> KilowattHours {
        match self {
            Self::GridConsumption => report.grid_energy_import,
            Self::GridReturn => report.grid_energy_export,
            Self::SolarProduction => report.solar_energy,
            Self::BatteryCharging => report.battery_energy_charged,
            Self::BatteryDischarging => report.battery_energy_discharged,
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().iter().find(|sensor| sensor.id() == id)
    }

    #[must_use]
    pub fn unique_id(self, host: &str) -> String {
        format!("{host}_{}", self.id())
    }

    #[must_use]
    pub fn display_name(self, host: &str) -> String {
        format!("{host} {}", self.name())
    }
}

impl Display for EnergySensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Instant measurement sensor: power in watts or the battery state of charge.
#[derive(Debug, enumset::EnumSetType)]
pub enum Gauge {
    GridPower,
    SolarPower,
    BatteryPower,
    HomePower,
    BatterySoc,
}

impl Gauge {
    #[must_use]
    pub fn all() -> EnumSet<Self> {
        EnumSet::all()
    }

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::GridPower => "grid_power",
            Self::SolarPower => "solar_power",
            Self::BatteryPower => "battery_power",
            Self::HomePower => "home_power",
            Self::BatterySoc => "battery_soc",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GridPower => "Grid Power",
            Self::SolarPower => "Solar Power",
            Self::BatteryPower => "Battery Power",
            Self::HomePower => "Home Consumption",
            Self::BatterySoc => "Battery State of Charge",
        }
    }

    /// Current value formatted with its unit.
    #[must_use]
    pub fn display_value(self, metrics: &MetricSet) -> String {
        match self {
            Self::GridPower => metrics.grid_power.to_string(),
            Self::SolarPower => metrics.solar_power.to_string(),
            Self::BatteryPower => metrics.battery_power.to_string(),
            Self::HomePower => metrics.home_power.to_string(),
            Self::BatterySoc => metrics.battery_soc.to_string(),
        }
    }

    #[must_use]
    pub fn unique_id(self, host: &str) -> String {
        format!("{host}_{}", self.id())
    }
}
