use std::ops::Mul;

use crate::quantity::{energy::KilowattHours, time::Hours};

quantity!(Watts, suffix: "W", precision: 0);

impl Watts {
    /// Keep the value when it flows in the positive direction, otherwise zero.
    #[must_use]
    pub const fn positive_part(self) -> Self {
        if self.0 > 0.0 { self } else { Self::ZERO }
    }
}

impl Mul<Hours> for Watts {
    type Output = KilowattHours;

    fn mul(self, hours: Hours) -> Self::Output {
        KilowattHours(self.0 * 0.001 * hours.0)
    }
}
