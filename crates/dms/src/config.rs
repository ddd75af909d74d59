//! DMS configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// EAR strictly above this is an open eye
    pub ear_open_threshold: f64,

    /// EAR strictly above this (and not open) is a blink; at or below is closed
    pub ear_blink_threshold: f64,

    /// MAR strictly above this is a yawn
    pub yawn_threshold: f64,

    /// Eyes closed threshold for sleep alert (milliseconds)
    pub eye_closed_duration_ms: u64,

    /// How long a warning status is held, and the alarm cooldown (milliseconds)
    pub alarm_display_duration_ms: u64,

    /// Ratio denominators at or below this are treated as degenerate
    pub degenerate_epsilon: f64,

    /// Minimum bounding-box IoU to treat two detections as the same face
    pub face_match_iou: f32,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_open_threshold: 0.25,
            ear_blink_threshold: 0.21,
            yawn_threshold: 0.7,
            eye_closed_duration_ms: 2000,
            alarm_display_duration_ms: 5000,
            degenerate_epsilon: 1e-6,
            face_match_iou: 0.3,
        }
    }
}

impl DmsConfig {
    pub fn eye_closed_duration(&self) -> Duration {
        Duration::from_millis(self.eye_closed_duration_ms)
    }

    pub fn alarm_display_duration(&self) -> Duration {
        Duration::from_millis(self.alarm_display_duration_ms)
    }

    /// Reject threshold combinations the classifiers cannot honour.
    ///
    /// NaN thresholds are rejected explicitly; every comparison below
    /// would otherwise silently pass or fail for them.
    pub fn validate(&self) -> Result<(), DmsError> {
        let ratios = [
            ("ear_open_threshold", self.ear_open_threshold),
            ("ear_blink_threshold", self.ear_blink_threshold),
            ("yawn_threshold", self.yawn_threshold),
            ("degenerate_epsilon", self.degenerate_epsilon),
        ];
        for (field, value) in ratios {
            if value.is_nan() {
                return Err(DmsError::Config(format!("{} must be a number", field)));
            }
        }

        if self.ear_blink_threshold < 0.0 {
            return Err(DmsError::Config(format!(
                "ear_blink_threshold must be non-negative, got {}",
                self.ear_blink_threshold
            )));
        }
        if self.ear_blink_threshold >= self.ear_open_threshold {
            return Err(DmsError::Config(format!(
                "ear_blink_threshold ({}) must be below ear_open_threshold ({})",
                self.ear_blink_threshold, self.ear_open_threshold
            )));
        }
        if self.yawn_threshold <= 0.0 {
            return Err(DmsError::Config(format!(
                "yawn_threshold must be positive, got {}",
                self.yawn_threshold
            )));
        }
        if self.eye_closed_duration_ms == 0 || self.alarm_display_duration_ms == 0 {
            return Err(DmsError::Config("durations must be non-zero".into()));
        }
        if self.degenerate_epsilon < 0.0 {
            return Err(DmsError::Config("degenerate_epsilon must be non-negative".into()));
        }
        if !(0.0..=1.0).contains(&self.face_match_iou) {
            return Err(DmsError::Config(format!(
                "face_match_iou must be within [0, 1], got {}",
                self.face_match_iou
            )));
        }
        Ok(())
    }
}
