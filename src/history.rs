use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::Value;

use crate::payload::Sample;

/// Maximum number of retained scan entries.
pub const CAPACITY: usize = 100;

const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Clone, Debug)]
pub struct ScanEntry {
    pub timestamp: DateTime<Local>,
    pub sample: Sample,
}

/// Bounded window of scan entries, newest first, unique by whole-second timestamp.
#[derive(Default)]
pub struct ScanHistory {
    entries: Vec<ScanEntry>,
    known_timestamps: HashSet<i64>,
}

impl ScanHistory {
    /// Ingest the `val` entries of a `/scan` response.
    ///
    /// Returns the number of new entries that are retained after the eviction.
    pub fn ingest(&mut self, response: &Value, now: DateTime<Local>) -> usize {
        let Some(items) = response.get("val").and_then(Value::as_array) else {
            return 0;
        };
        let mut added_timestamps = HashSet::new();
        for sample in items.iter().filter_map(Value::as_object) {
            let timestamp = resolve_timestamp(sample, now);
            if self.known_timestamps.insert(timestamp.timestamp()) {
                self.entries.push(ScanEntry { timestamp, sample: sample.clone() });
                added_timestamps.insert(timestamp.timestamp());
            }
        }
        self.entries.sort_by(|lhs, rhs| rhs.timestamp.cmp(&lhs.timestamp));
        if self.entries.len() > CAPACITY {
            for evicted in self.entries.drain(CAPACITY..) {
                let timestamp = evicted.timestamp.timestamp();
                self.known_timestamps.remove(&timestamp);
                added_timestamps.remove(&timestamp);
            }
        }
        added_timestamps.len()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&ScanEntry> {
        self.entries.first()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }
}

#[expect(clippy::cast_possible_truncation)]
fn resolve_timestamp(sample: &Sample, now: DateTime<Local>) -> DateTime<Local> {
    if let Some(seconds) = sample.get("timestamp").and_then(Value::as_f64)
        && let Some(timestamp) = DateTime::from_timestamp(seconds as i64, 0)
    {
        return timestamp.with_timezone(&Local);
    }
    sample
        .get("time")
        .and_then(Value::as_str)
        .and_then(|time| NaiveDateTime::parse_from_str(time, TIME_FORMAT).ok())
        .and_then(|time| time.and_local_timezone(Local).earliest())
        .unwrap_or(now)
}
