use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp format the dashboard expects, e.g. "Mar 01, 2025, 02:30:05 PM"
const ALERT_TIME_FORMAT: &str = "%b %d, %Y, %I:%M:%S %p";

/// One classified observation from the perception layer, for one cycle.
/// Confidence filtering already happened upstream; no event carries its
/// own alert status, the engine decides that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum DetectionEvent {
    /// Detected object, by class name (e.g. "cell phone", "book", "person")
    Object {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject_id: Option<String>,
    },
    /// Gaze directed away from the desk
    Gaze {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject_id: Option<String>,
    },
    /// Hand raised to head height
    HandNearHead {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject_id: Option<String>,
    },
    /// Recognized hand gesture, by name
    Gesture {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject_id: Option<String>,
    },
    /// Number of people visible in the frame (frame-global, no subject)
    PersonCount { count: usize },
}

impl DetectionEvent {
    /// Decode one cycle's batch, element by element. Elements that fail
    /// to parse (unknown category, missing fields) are skipped with a
    /// debug log; a noisy producer must not be able to abort a cycle.
    pub fn decode_batch(values: Vec<serde_json::Value>) -> Vec<DetectionEvent> {
        values
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(event) => Some(event),
                Err(e) => {
                    log::debug!("Skipping malformed detection event: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Identity used to deduplicate and time-track a condition.
/// Typed so an object label can never collide with a gesture of the same
/// name. `MultiplePeople` is synthetic: one key for the whole frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertKey {
    Object(String),
    Gaze,
    HandNearHead,
    Gesture(String),
    MultiplePeople,
}

impl AlertKey {
    /// Render the alert sentence shown on the dashboard for this key
    pub fn description(&self) -> String {
        match self {
            AlertKey::Object(label) => format!(
                "Prohibited Object Detected: A '{}' is visible near the student.",
                label
            ),
            AlertKey::Gaze => {
                "Suspicious Gaze Detected: The student is looking away from their desk \
                 for an extended period."
                    .to_string()
            }
            AlertKey::HandNearHead => {
                "Suspicious Pose Detected: The student has their hand raised near their \
                 head, which could be used to obscure actions."
                    .to_string()
            }
            AlertKey::Gesture(label) => format!(
                "Suspicious Action Detected: A '{}' was made, which is unusual for an \
                 exam environment.",
                label
            ),
            AlertKey::MultiplePeople => {
                "Potential Collusion Detected: More than one person is visible in the frame."
                    .to_string()
            }
        }
    }
}

/// One fired alert. Immutable once appended; log order is append order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Alert as served to the dashboard
#[derive(Debug, Serialize)]
pub struct AlertView {
    pub time: String,
    pub description: String,
}

impl From<&AlertRecord> for AlertView {
    fn from(record: &AlertRecord) -> Self {
        Self {
            time: record.timestamp.format(ALERT_TIME_FORMAT).to_string(),
            description: record.description.clone(),
        }
    }
}

/// Response body for /get_alerts
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertView>,
}

/// Engine snapshot for /status
#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub monitoring: bool,
    pub session_id: Option<Uuid>,
    pub alerts_logged: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_detection_event_wire_format() {
        let json = r#"{"category": "object", "label": "cell phone", "subject_id": "person_0"}"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        match event {
            DetectionEvent::Object { label, subject_id } => {
                assert_eq!(label, "cell phone");
                assert_eq!(subject_id.as_deref(), Some("person_0"));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let json = r#"{"category": "person_count", "count": 2}"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, DetectionEvent::PersonCount { count: 2 }));
    }

    #[test]
    fn test_subject_id_is_optional() {
        let json = r#"{"category": "gaze"}"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, DetectionEvent::Gaze { subject_id: None }));
    }

    #[test]
    fn test_decode_batch_skips_malformed_events() {
        let batch = vec![
            serde_json::json!({"category": "gesture", "label": "Peace Sign Gesture"}),
            serde_json::json!({"category": "backflip"}),
            serde_json::json!({"category": "object"}),
            serde_json::json!("not even an object"),
            serde_json::json!({"category": "hand_near_head", "subject_id": "person_1"}),
        ];

        let events = DetectionEvent::decode_batch(batch);

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DetectionEvent::Gesture { .. }));
        assert!(matches!(events[1], DetectionEvent::HandNearHead { .. }));
    }

    #[test]
    fn test_event_json_roundtrip() {
        let event = DetectionEvent::Object {
            label: "book".into(),
            subject_id: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""category":"object""#));
        assert!(!json.contains("subject_id"));

        let back: DetectionEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, DetectionEvent::Object { .. }));
    }

    #[test]
    fn test_alert_descriptions() {
        assert_eq!(
            AlertKey::Object("cell phone".into()).description(),
            "Prohibited Object Detected: A 'cell phone' is visible near the student."
        );
        assert_eq!(
            AlertKey::Gaze.description(),
            "Suspicious Gaze Detected: The student is looking away from their desk \
             for an extended period."
        );
        assert_eq!(
            AlertKey::HandNearHead.description(),
            "Suspicious Pose Detected: The student has their hand raised near their \
             head, which could be used to obscure actions."
        );
        assert_eq!(
            AlertKey::Gesture("Peace Sign Gesture".into()).description(),
            "Suspicious Action Detected: A 'Peace Sign Gesture' was made, which is \
             unusual for an exam environment."
        );
        assert_eq!(
            AlertKey::MultiplePeople.description(),
            "Potential Collusion Detected: More than one person is visible in the frame."
        );
    }

    #[test]
    fn test_alert_keys_do_not_collide_across_categories() {
        // Same string, different category: two distinct keys
        assert_ne!(
            AlertKey::Object("Peace Sign Gesture".into()),
            AlertKey::Gesture("Peace Sign Gesture".into())
        );
    }

    #[test]
    fn test_alert_view_time_format() {
        let record = AlertRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 14, 30, 5).unwrap(),
            description: "test".into(),
        };
        let view = AlertView::from(&record);
        assert_eq!(view.time, "Mar 01, 2025, 02:30:05 PM");
    }
}
