use chrono::{DateTime, Local};

use crate::quantity::{energy::KilowattHours, power::Watts, time::Hours};

/// Riemann-sum energy accumulator for a sensor that only exposes instant power.
///
/// Only positive increments accumulate, so the total never decreases. Energy sensors feed it
/// sign-split power, which is never negative.
#[derive(Copy, Clone, Debug, Default)]
pub struct EnergyIntegrator {
    accumulated: KilowattHours,
    last_update: Option<DateTime<Local>>,
    last_power: Watts,
}

impl EnergyIntegrator {
    #[must_use]
    pub fn seeded(restored: Option<KilowattHours>) -> Self {
        Self { accumulated: restored.unwrap_or_default(), ..Self::default() }
    }

    /// Advance the integrator to `now` and return the total to expose.
    ///
    /// A positive `reported` total from the device takes precedence over the integral.
    pub fn tick(
        &mut self,
        power: Watts,
        now: DateTime<Local>,
        reported: KilowattHours,
    ) -> KilowattHours {
        let last_update = self.last_update.replace(now);
        self.last_power = power;
        if reported > KilowattHours::ZERO {
            return reported;
        }
        if let Some(last_update) = last_update {
            let increment = power * Hours::from(now - last_update);
            if increment > KilowattHours::ZERO {
                self.accumulated += increment;
            }
        }
        self.accumulated.round_to_watt_hours()
    }

    #[must_use]
    pub const fn last_power(&self) -> Watts {
        self.last_power
    }
}
