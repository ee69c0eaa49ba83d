use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Traffic statistics attached to operations and specs as
/// `x-counters-total` / `x-counters-per-source`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counter {
    #[serde(default)]
    pub entries: u64,

    #[serde(default)]
    pub failures: u64,

    /// Unix seconds of the earliest observation, 0 when unset
    #[serde(default)]
    pub first_seen: f64,

    #[serde(default)]
    pub last_seen: f64,

    /// Sum of response times in seconds
    #[serde(default, rename = "sumRT")]
    pub sum_rt: f64,

    /// Sum of inter-arrival gaps in seconds
    #[serde(default)]
    pub sum_duration: f64,
}

impl Counter {
    /// Records one observation.
    ///
    /// # Panics
    ///
    /// Panics when `duration` is negative; callers clamp out-of-order
    /// arrivals to zero before getting here.
    pub fn add_entry(&mut self, ts: f64, rt: f64, success: bool, duration: f64) {
        assert!(
            duration >= 0.0,
            "negative inter-arrival duration: {duration}"
        );

        self.entries += 1;
        if !success {
            self.failures += 1;
        }
        self.sum_rt += rt;
        self.sum_duration += duration;
        self.first_seen = earliest(self.first_seen, ts);
        self.last_seen = self.last_seen.max(ts);
    }

    pub fn merge(&mut self, other: &Counter) {
        self.entries += other.entries;
        self.failures += other.failures;
        self.sum_rt += other.sum_rt;
        self.sum_duration += other.sum_duration;
        self.first_seen = earliest(self.first_seen, other.first_seen);
        self.last_seen = self.last_seen.max(other.last_seen);
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn hits_per_second(&self) -> f64 {
        if self.sum_duration > 0.0 {
            self.entries as f64 / self.sum_duration
        } else {
            0.0
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn average_response_time(&self) -> f64 {
        if self.entries > 0 {
            self.sum_rt / self.entries as f64
        } else {
            0.0
        }
    }

    /// Human-readable summary used as the operation description.
    pub fn describe(&self) -> String {
        format!(
            "{DESCRIPTION_PREFIX}{} entries ({} failed), at {:.3} hits/s, average response time {:.3} seconds",
            self.entries,
            self.failures,
            self.hits_per_second(),
            self.average_response_time()
        )
    }
}

const DESCRIPTION_PREFIX: &str = "Observed ";

/// Descriptions produced by [`Counter::describe`] get refreshed; anything
/// else was written by a person and stays.
pub fn is_generated_description(description: Option<&str>) -> bool {
    match description {
        None => true,
        Some(text) => text.is_empty() || text.starts_with(DESCRIPTION_PREFIX),
    }
}

fn earliest(current: f64, candidate: f64) -> f64 {
    if current == 0.0 {
        candidate
    } else if candidate == 0.0 {
        current
    } else {
        current.min(candidate)
    }
}

/// Counters keyed by source identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterMap(BTreeMap<String, Counter>);

impl CounterMap {
    pub fn add_entry(&mut self, source: &str, ts: f64, rt: f64, success: bool, duration: f64) {
        self.0
            .entry(source.to_string())
            .or_default()
            .add_entry(ts, rt, success, duration);
    }

    pub fn merge(&mut self, other: &CounterMap) {
        for (source, counter) in &other.0 {
            self.0.entry(source.clone()).or_default().merge(counter);
        }
    }

    pub fn get(&self, source: &str) -> Option<&Counter> {
        self.0.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Counter)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
