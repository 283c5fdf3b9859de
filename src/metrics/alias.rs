use crate::payload::{Sample, number};

/// Ordered candidate field names of one canonical metric.
///
/// Resolution is first-present-wins: a legitimate `0` stops the search, while missing, `null`
/// and non-numeric values fall through to the next candidate.
#[derive(Copy, Clone)]
pub struct Aliases(pub &'static [&'static str]);

impl Aliases {
    pub fn resolve(self, sample: &Sample) -> Option<f64> {
        self.0.iter().find_map(|key| sample.get(*key).and_then(number))
    }

    /// Sum of all present candidates, or `None` if there are none.
    pub fn sum(self, sample: &Sample) -> Option<f64> {
        self.0.iter().filter_map(|key| sample.get(*key).and_then(number)).reduce(|lhs, rhs| lhs + rhs)
    }
}

pub const GRID_POWER: Aliases = Aliases(&["ac_input_total_active_power", "em_power", "grid_power"]);
pub const PV_INPUTS: Aliases = Aliases(&["pv_input_power1", "pv_input_power2", "pv_input_power3"]);
pub const SOLAR_POWER: Aliases = Aliases(&["pv_power", "solar_power"]);
pub const BATTERY_DISCHARGE_POWER: Aliases = Aliases(&["battery_discharge_power"]);
pub const BATTERY_CHARGE_POWER: Aliases = Aliases(&["battery_charge_power"]);
pub const BATTERY_POWER: Aliases = Aliases(&["battery_power"]);
pub const BATTERY_CURRENT: Aliases = Aliases(&["battery_current"]);
pub const BATTERY_VOLTAGE: Aliases = Aliases(&["p_battery_voltage", "battery_voltage"]);
pub const HOME_POWER: Aliases = Aliases(&["ac_output_total_active_power", "home_power", "load_power"]);
pub const BATTERY_SOC: Aliases = Aliases(&["battery_soc", "soc", "bat_soc"]);

pub const GRID_ENERGY_IMPORT: Aliases = Aliases(&["grid_energy_import", "em_energy_import"]);
pub const GRID_ENERGY_EXPORT: Aliases = Aliases(&["grid_energy_export", "em_energy_export"]);
pub const SOLAR_ENERGY: Aliases = Aliases(&["solar_energy", "pv_energy"]);
pub const BATTERY_ENERGY_CHARGED: Aliases = Aliases(&["battery_energy_charged", "battery_charge_energy"]);
pub const BATTERY_ENERGY_DISCHARGED: Aliases =
    Aliases(&["battery_energy_discharged", "battery_discharge_energy"]);
