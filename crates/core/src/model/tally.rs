use std::collections::BTreeMap;

/// Running per-session counters (points, tossups heard, and so on).
///
/// Counters that were never shifted read as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTally {
    counters: BTreeMap<String, f64>,
}

impl SessionTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the named counter. Negative deltas decrease it.
    pub fn shift(&mut self, key: &str, delta: f64) {
        *self.counters.entry(key.to_owned()).or_insert(0.0) += delta;
    }

    #[must_use]
    pub fn get(&self, key: &str) -> f64 {
        self.counters.get(key).copied().unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
