use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default location of the detection parameter file, relative to the
/// working directory. Overridable via the first CLI argument.
pub const DEFAULT_PARAMS_PATH: &str = "config/detection_parameters.json";

/// Detection parameters, one table per detection family.
/// Loaded once at startup and fixed for the lifetime of the process.
/// Missing tables and fields fall back to the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    pub object_detection: ObjectDetectionParams,
    pub gaze_detection: GazeDetectionParams,
    pub pose_detection: PoseDetectionParams,
    pub gesture_detection: GestureDetectionParams,
    pub multiple_people_detection: MultiplePeopleParams,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            object_detection: ObjectDetectionParams::default(),
            gaze_detection: GazeDetectionParams::default(),
            pose_detection: PoseDetectionParams::default(),
            gesture_detection: GestureDetectionParams::default(),
            multiple_people_detection: MultiplePeopleParams::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDetectionParams {
    pub enabled: bool,
    /// Minimum box confidence, applied by the upstream object detector.
    /// Served back on /config but never read by the engine itself.
    pub confidence_min: f64,
}

impl Default for ObjectDetectionParams {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_min: 0.55,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeDetectionParams {
    pub enabled: bool,
    /// How long a suspicious gaze must be held before it alerts
    pub threshold_seconds: f64,
    /// Gaze-ratio cutoff, applied by the upstream gaze analyzer
    pub sensitivity: f64,
}

impl Default for GazeDetectionParams {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_seconds: 3.0,
            sensitivity: 0.8,
        }
    }
}

impl GazeDetectionParams {
    pub fn threshold(&self) -> chrono::Duration {
        secs_to_duration(self.threshold_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseDetectionParams {
    pub enabled: bool,
    /// How long a hand must stay near the head before it alerts
    pub hand_near_head_threshold_seconds: f64,
}

impl Default for PoseDetectionParams {
    fn default() -> Self {
        Self {
            enabled: true,
            hand_near_head_threshold_seconds: 2.0,
        }
    }
}

impl PoseDetectionParams {
    pub fn hand_near_head_threshold(&self) -> chrono::Duration {
        secs_to_duration(self.hand_near_head_threshold_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureDetectionParams {
    pub enabled: bool,
}

impl Default for GestureDetectionParams {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplePeopleParams {
    pub enabled: bool,
    /// Largest person count that does not alert
    pub max_people: usize,
}

impl Default for MultiplePeopleParams {
    fn default() -> Self {
        Self {
            enabled: true,
            max_people: 1,
        }
    }
}

fn secs_to_duration(seconds: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((seconds * 1000.0).round() as i64)
}

/// All the ways loading the parameter file can go wrong
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

fn read_params(path: &Path) -> Result<DetectionParams, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let params = serde_json::from_str(&text)?;
    Ok(params)
}

/// Load detection parameters from `path`. Any failure falls back to the
/// built-in defaults with a warning; the caller always gets a usable
/// configuration and never sees the error.
pub fn load_params(path: &Path) -> DetectionParams {
    match read_params(path) {
        Ok(params) => {
            log::info!("Detection parameters loaded from {:?}", path);
            params
        }
        Err(e) => {
            log::warn!(
                "Failed to load detection parameters from {:?}: {}. Using defaults.",
                path,
                e
            );
            DetectionParams::default()
        }
    }
}
