use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    coordinator::{DeviceInfo, Update},
    quantity::power::Watts,
    sensor::Gauge,
};

pub fn build_sensor_table(host: &str, update: &Update) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(vec!["Sensor", "ID", "Value", "Power"]);
    for gauge in Gauge::all() {
        table.add_row(vec![
            Cell::new(gauge.name()),
            Cell::new(gauge.unique_id(host)).add_attribute(Attribute::Dim),
            Cell::new(gauge.display_value(&update.metrics)).set_alignment(CellAlignment::Right),
            Cell::new(""),
        ]);
    }
    for (sensor, reading) in &update.energy {
        table.add_row(vec![
            Cell::new(sensor.name()),
            Cell::new(sensor.unique_id(host)).add_attribute(Attribute::Dim),
            Cell::new(reading.total).set_alignment(CellAlignment::Right),
            Cell::new(reading.power).set_alignment(CellAlignment::Right).fg(
                if reading.power > Watts::ZERO { Color::Green } else { Color::Reset },
            ),
        ]);
    }
    table
}

pub fn build_device_table(device: &DeviceInfo) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    for (name, value) in
        [("Serial", &device.serial), ("Model", &device.model), ("Software", &device.software)]
    {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(value.as_deref().unwrap_or("unknown")),
        ]);
    }
    table
}
