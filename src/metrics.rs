//! Canonical metrics derived from a normalized sample.

pub mod alias;
mod report;

use serde::Serialize;

pub use self::report::EnergyReport;
use crate::{
    payload::Sample,
    quantity::{power::Watts, ratios::Percentage},
};

/// Instant power readings and their sign splits.
///
/// Positive `grid_power` means import from the grid, positive `battery_power` means the battery
/// is discharging into the home, so that `home = grid + solar + battery`.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Serialize)]
pub struct MetricSet {
    pub grid_power: Watts,
    pub solar_power: Watts,
    pub battery_power: Watts,
    pub home_power: Watts,
    pub battery_soc: Percentage,

    pub grid_consumption_power: Watts,
    pub grid_return_power: Watts,
    pub battery_discharging_power: Watts,
    pub battery_charging_power: Watts,

    pub reported: EnergyReport,
}

impl MetricSet {
    pub fn derive(sample: &Sample) -> Self {
        let grid_power = Watts(alias::GRID_POWER.resolve(sample).unwrap_or_default());
        let solar_power = Watts(
            alias::PV_INPUTS
                .sum(sample)
                .or_else(|| alias::SOLAR_POWER.resolve(sample))
                .unwrap_or_default(),
        );
        let battery_power = Watts(battery_power(sample).unwrap_or_default());
        let home_power = alias::HOME_POWER
            .resolve(sample)
            .map_or(grid_power + solar_power + battery_power, Watts);
        Self {
            grid_power,
            solar_power,
            battery_power,
            home_power,
            battery_soc: Percentage(alias::BATTERY_SOC.resolve(sample).unwrap_or_default()),
            grid_consumption_power: grid_power.positive_part(),
            grid_return_power: (-grid_power).positive_part(),
            battery_discharging_power: battery_power.positive_part(),
            battery_charging_power: (-battery_power).positive_part(),
            reported: EnergyReport::default(),
        }
    }

    pub const fn with_reported(mut self, reported: EnergyReport) -> Self {
        self.reported = reported;
        self
    }
}

/// Explicit charge and discharge fields first, then the signed field, then the V×I estimate.
///
/// The device reports a positive battery current while charging, hence the estimate is negated.
fn battery_power(sample: &Sample) -> Option<f64> {
    let discharge = alias::BATTERY_DISCHARGE_POWER.resolve(sample);
    let charge = alias::BATTERY_CHARGE_POWER.resolve(sample);
    if discharge.is_some() || charge.is_some() {
        return Some(discharge.unwrap_or_default() - charge.unwrap_or_default());
    }
    alias::BATTERY_POWER.resolve(sample).or_else(|| {
        let current = alias::BATTERY_CURRENT.resolve(sample)?;
        let voltage = alias::BATTERY_VOLTAGE.resolve(sample)?;
        Some(-(current * voltage))
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    use super::*;
    use crate::quantity::energy::KilowattHours;

    fn derive(value: serde_json::Value) -> MetricSet {
        MetricSet::derive(value.as_object().unwrap())
    }

    #[test]
    fn reference_sample_ok() {
        let metrics = derive(json!({
            "ac_input_total_active_power": 500,
            "ac_output_total_active_power": 300,
            "pv_input_power1": 200,
            "pv_input_power2": 100,
            "battery_soc": 80,
        }));
        assert_eq!(metrics.grid_power, Watts(500.0));
        assert_eq!(metrics.home_power, Watts(300.0));
        assert_eq!(metrics.solar_power, Watts(300.0));
        assert_eq!(metrics.battery_soc, Percentage(80.0));
        assert_eq!(metrics.battery_power, Watts::ZERO);
        assert_eq!(metrics.grid_consumption_power, Watts(500.0));
        assert_eq!(metrics.grid_return_power, Watts::ZERO);
    }

    #[test]
    fn export_splits_into_return() {
        let metrics = derive(json!({"grid_power": -150}));
        assert_eq!(metrics.grid_consumption_power, Watts::ZERO);
        assert_eq!(metrics.grid_return_power, Watts(150.0));
    }

    #[test]
    fn explicit_battery_fields_take_precedence() {
        let metrics = derive(json!({
            "battery_charge_power": 400,
            "battery_power": 999,
            "battery_current": 10,
            "battery_voltage": 50,
        }));
        assert_eq!(metrics.battery_power, Watts(-400.0));
        assert_eq!(metrics.battery_charging_power, Watts(400.0));
        assert_eq!(metrics.battery_discharging_power, Watts::ZERO);
    }

    #[test]
    fn battery_power_is_estimated_from_current_and_voltage() {
        let metrics = derive(json!({"battery_current": "-12.5", "p_battery_voltage": 52.0}));
        assert_abs_diff_eq!(metrics.battery_power.0, 650.0);
        assert_abs_diff_eq!(metrics.battery_discharging_power.0, 650.0);
        assert_eq!(metrics.battery_charging_power, Watts::ZERO);
    }

    #[test]
    fn positive_battery_current_is_charging() {
        let metrics = derive(json!({
            "battery_current": 10,
            "p_battery_voltage": 50,
            "pv_input_power1": 1000,
            "em_power": 0,
        }));
        assert_eq!(metrics.battery_power, Watts(-500.0));
        assert_eq!(metrics.battery_charging_power, Watts(500.0));
        assert_eq!(metrics.battery_discharging_power, Watts::ZERO);
        assert_eq!(metrics.home_power, Watts(500.0));
    }

    #[test]
    fn battery_estimate_needs_both_factors() {
        let metrics = derive(json!({"battery_current": 10}));
        assert_eq!(metrics.battery_power, Watts::ZERO);
    }

    #[test]
    fn home_falls_back_to_balance() {
        let metrics = derive(json!({"em_power": -100, "pv_power": 900, "battery_power": -300}));
        assert_eq!(metrics.home_power, Watts(500.0));
        assert_eq!(metrics.battery_charging_power, Watts(300.0));
    }

    #[test]
    fn zero_values_are_present() {
        let metrics = derive(json!({
            "ac_input_total_active_power": 0,
            "em_power": 800,
            "pv_input_power1": 0,
            "pv_power": 1200,
            "battery_soc": 0,
            "soc": 55,
        }));
        assert_eq!(metrics.grid_power, Watts::ZERO);
        assert_eq!(metrics.solar_power, Watts::ZERO);
        assert_eq!(metrics.battery_soc, Percentage::ZERO);
    }

    #[test]
    fn non_numeric_values_fall_through() {
        let metrics = derive(json!({"battery_soc": null, "soc": "n/a", "bat_soc": "64.5"}));
        assert_eq!(metrics.battery_soc, Percentage(64.5));
    }

    #[test]
    fn empty_sample_is_all_zero() {
        let metrics = MetricSet::derive(&Sample::new());
        assert_eq!(metrics.home_power, Watts::ZERO);
        assert_eq!(metrics.reported.solar_energy, KilowattHours::ZERO);
    }

    #[test]
    fn reported_energies_ok() {
        let sample = json!({"grid_energy_import": "12.5", "pv_energy": 30.25});
        let report = EnergyReport::derive(sample.as_object().unwrap());
        let metrics = MetricSet::default().with_reported(report);
        assert_eq!(metrics.reported.grid_energy_import, KilowattHours(12.5));
        assert_eq!(metrics.reported.solar_energy, KilowattHours(30.25));
        assert_eq!(metrics.reported.grid_energy_export, KilowattHours::ZERO);
    }
}
