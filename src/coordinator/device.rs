use serde::Serialize;

use crate::payload::{Sample, text};

/// Device metadata reported alongside the instant snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub serial: Option<String>,
    pub model: Option<String>,
    pub software: Option<String>,
}

impl DeviceInfo {
    #[must_use]
    pub fn extract(sample: &Sample) -> Self {
        let field = |key: &str| sample.get(key).and_then(text);
        Self { serial: field("serial"), model: field("type"), software: field("software") }
    }
}
