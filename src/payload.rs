//! Flattening of the inverter's inconsistent JSON envelopes.
//!
//! Firmware versions wrap the same instant snapshot differently: a bare object, an object with
//! a JSON-encoded `result` string, a list of objects, or an object nesting the snapshot under
//! `val`, `data` or `payload`. [`normalize`] peels those envelopes off and never fails.

use serde_json::{Map, Value};

/// Flat mapping of a vendor field name to its scalar value.
pub type Sample = Map<String, Value>;

const ENVELOPE_KEYS: [&str; 2] = ["data", "payload"];

/// Reduce any response shape to a single flat sample, or an empty one if nothing fits.
#[must_use]
pub fn normalize(raw: &Value) -> Sample {
    match raw {
        Value::Array(items) => items.first().map(normalize).unwrap_or_default(),
        Value::String(encoded) => serde_json::from_str::<Value>(encoded)
            .map(|decoded| normalize(&decoded))
            .unwrap_or_default(),
        Value::Object(_) => {
            if let Some(Value::String(encoded)) = raw.get("result")
                && let Ok(decoded) = serde_json::from_str::<Value>(encoded)
            {
                return normalize(&decoded);
            }
            let mut value = raw;
            if let Some(first) =
                value.get("val").and_then(Value::as_array).and_then(|items| items.first())
            {
                value = first;
            }
            if let Some(inner) =
                ENVELOPE_KEYS.iter().find_map(|key| unwrap_envelope(value.get(*key)))
            {
                value = inner;
            }
            value.as_object().cloned().unwrap_or_default()
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => Sample::new(),
    }
}

fn unwrap_envelope(inner: Option<&Value>) -> Option<&Value> {
    match inner? {
        object @ Value::Object(_) => Some(object),
        Value::Array(items) => items.first(),
        _ => None,
    }
}

/// Coerce a scalar to a number: numbers as-is, numeric strings, and booleans as `1` or `0`.
#[must_use]
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|number| number.is_finite()),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Render a scalar as text, for identifiers the firmware sends either as strings or numbers.
#[must_use]
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
