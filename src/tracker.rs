use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

use crate::models::AlertKey;

/// Per-key state: when the condition was first seen in the current
/// continuous run, and whether the alert for that run has fired
#[derive(Debug, Clone)]
struct TrackerEntry {
    first_observed_at: DateTime<Utc>,
    fired: bool,
}

/// Tracks how long each alert condition has been continuously observed,
/// firing at most once per continuous occurrence.
///
/// Keys must be reported every cycle they are active and retired every
/// cycle via [`retire`](Self::retire); a key absent for even one cycle
/// loses its accumulated time and starts over on its next appearance.
#[derive(Debug)]
pub struct DurationTracker {
    entries: HashMap<AlertKey, TrackerEntry>,
}

impl DurationTracker {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record that `key` is active at `now`. Returns `true` exactly once
    /// per continuous occurrence: on the first observation where the
    /// condition has been held for at least `required`.
    ///
    /// The first observation of a new occurrence never fires, even with a
    /// zero `required`: every alert gets at least one confirming cycle.
    pub fn observe(&mut self, key: &AlertKey, now: DateTime<Utc>, required: Duration) -> bool {
        match self.entries.get_mut(key) {
            None => {
                self.entries.insert(
                    key.clone(),
                    TrackerEntry {
                        first_observed_at: now,
                        fired: false,
                    },
                );
                false
            }
            Some(entry) => {
                if !entry.fired && now - entry.first_observed_at >= required {
                    entry.fired = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Drop every key not observed this cycle, so a later re-occurrence
    /// starts a fresh timer. Must run once per cycle, after all events
    /// have been evaluated.
    pub fn retire(&mut self, active: &HashSet<AlertKey>) {
        self.entries.retain(|key, _| active.contains(key));
    }

    /// Forget all keys (session reset)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
