quantity!(KilowattHours, suffix: "kWh", precision: 3);

impl KilowattHours {
    /// Round to the nearest watt-hour.
    #[must_use]
    pub fn round_to_watt_hours(self) -> Self {
        Self((self.0 * 1000.0).round() / 1000.0)
    }
}
