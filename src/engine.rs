use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::alert_log::{AlertLog, ALERT_LOG_CAPACITY};
use crate::config::DetectionParams;
use crate::models::{AlertKey, AlertRecord, DetectionEvent, EngineStatus};
use crate::tracker::DurationTracker;


/// Object label the upstream detector uses for people. Person boxes feed
/// the Multiple People rule, never the prohibited-object rule.
const PERSON_LABEL: &str = "person";

/// What happened to one submitted cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Monitoring is stopped; the batch had no effect
    Discarded,
    /// The batch was processed and `fired` new alerts were logged
    Processed { fired: usize },
}

/// Mutable engine state. Everything lives behind one lock: cycle
/// processing and lifecycle calls may race (a control request can land
/// mid-frame) and must serialize against each other.
#[derive(Debug)]
struct EngineState {
    monitoring: bool,
    session_id: Option<Uuid>,
    tracker: DurationTracker,
    log: AlertLog,
}

/// The alert aggregation engine.
///
/// Consumes one detection batch per captured frame and decides which
/// conditions have persisted long enough, or occurred distinctly enough,
/// to be reported: at most once per continuous occurrence of each key.
/// Also owns the monitoring-session lifecycle: all tracked state is
/// scoped to a session and wiped on a fresh start.
pub struct AlertEngine {
    params: DetectionParams,
    state: Mutex<EngineState>,
}

impl AlertEngine {
    pub fn new(params: DetectionParams) -> Self {
        Self {
            params,
            state: Mutex::new(EngineState {
                monitoring: false,
                session_id: None,
                tracker: DurationTracker::new(),
                log: AlertLog::new(ALERT_LOG_CAPACITY),
            }),
        }
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Begin a monitoring session: wipe the previous session's alerts and
    /// timers and mint a fresh session id. Idempotent: starting while
    /// already monitoring changes nothing and returns the running id.
    pub fn start_session(&self) -> Uuid {
        let mut state = self.state.lock().unwrap();
        match (state.monitoring, state.session_id) {
            (true, Some(id)) => id,
            _ => {
                let session_id = Uuid::new_v4();
                state.monitoring = true;
                state.session_id = Some(session_id);
                state.tracker.clear();
                state.log.clear();
                log::info!("Monitoring session {} started", session_id);
                session_id
            }
        }
    }

    /// End the session. The alert log is kept so results stay readable
    /// after stopping. No-op when already stopped.
    pub fn stop_session(&self) {
        let mut state = self.state.lock().unwrap();
        if state.monitoring {
            state.monitoring = false;
            log::info!("Monitoring session stopped");
        }
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.state.lock().unwrap();
        EngineStatus {
            monitoring: state.monitoring,
            session_id: state.session_id,
            alerts_logged: state.log.len(),
        }
    }

    /// Process one cycle's worth of detection events at the current time
    pub fn ingest(&self, events: &[DetectionEvent]) -> CycleOutcome {
        self.ingest_at(events, Utc::now())
    }

    /// Process one cycle at an explicit timestamp. Cycles must arrive in
    /// chronological order; the timestamp is a parameter so tests control
    /// the clock.
    pub fn ingest_at(&self, events: &[DetectionEvent], now: DateTime<Utc>) -> CycleOutcome {
        let mut state = self.state.lock().unwrap();
        if !state.monitoring {
            log::debug!("Discarding detection batch: monitoring is stopped");
            return CycleOutcome::Discarded;
        }

        let mut active: HashSet<AlertKey> = HashSet::new();
        let mut newly_fired: Vec<AlertKey> = Vec::new();
        let mut person_boxes = 0usize;
        let mut reported_people: Option<usize> = None;

        for event in events {
            let (key, required) = match event {
                DetectionEvent::Object { label, .. } => {
                    if !self.params.object_detection.enabled {
                        continue;
                    }
                    if label == PERSON_LABEL {
                        person_boxes += 1;
                        continue;
                    }
                    (AlertKey::Object(label.clone()), Duration::zero())
                }
                DetectionEvent::Gaze { .. } => {
                    if !self.params.gaze_detection.enabled {
                        continue;
                    }
                    (AlertKey::Gaze, self.params.gaze_detection.threshold())
                }
                DetectionEvent::HandNearHead { .. } => {
                    if !self.params.pose_detection.enabled {
                        continue;
                    }
                    (
                        AlertKey::HandNearHead,
                        self.params.pose_detection.hand_near_head_threshold(),
                    )
                }
                DetectionEvent::Gesture { label, .. } => {
                    if !self.params.gesture_detection.enabled {
                        continue;
                    }
                    (AlertKey::Gesture(label.clone()), Duration::zero())
                }
                DetectionEvent::PersonCount { count } => {
                    reported_people = Some(reported_people.map_or(*count, |c| c.max(*count)));
                    continue;
                }
            };

            // Observe each key at most once per cycle: a second event with
            // the same key (two phones in frame) must not advance the
            // tracker past the confirmation cycle.
            if active.insert(key.clone()) && state.tracker.observe(&key, now, required) {
                newly_fired.push(key);
            }
        }

        // Multiple People is its own pass over the whole cycle. An
        // explicit person count wins; otherwise fall back to counting
        // person boxes.
        let people = reported_people.unwrap_or(person_boxes);
        if self.params.multiple_people_detection.enabled
            && people > self.params.multiple_people_detection.max_people
        {
            let key = AlertKey::MultiplePeople;
            if active.insert(key.clone()) && state.tracker.observe(&key, now, Duration::zero()) {
                newly_fired.push(key);
            }
        }

        let fired = newly_fired.len();
        for key in newly_fired {
            log::info!("Alert fired: {:?}", key);
            state.log.append(AlertRecord {
                timestamp: now,
                description: key.description(),
            });
        }

        // Keys absent this cycle restart from zero on their next
        // appearance
        state.tracker.retire(&active);

        CycleOutcome::Processed { fired }
    }

    /// Consistent snapshot of the alert log, newest first
    pub fn recent_alerts(&self) -> Vec<AlertRecord> {
        let state = self.state.lock().unwrap();
        state.log.recent_first().cloned().collect()
    }
}
