//! Driver state tracking

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Fatigue status, ordered by severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FatigueStatus {
    #[default]
    Normal,
    YawnWarning,
    SleepDanger,
}

/// RGB display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FatigueStatus {
    /// Colour the renderer should draw this status in
    pub fn display_color(&self) -> Rgb {
        match self {
            FatigueStatus::Normal => Rgb(0, 255, 0),
            FatigueStatus::YawnWarning => Rgb(0, 0, 255),
            FatigueStatus::SleepDanger => Rgb(255, 0, 0),
        }
    }

    /// Short on-screen status line
    pub fn message(&self) -> &'static str {
        match self {
            FatigueStatus::Normal => "All good!",
            FatigueStatus::YawnWarning => "Yawn detected. Please be alert.",
            FatigueStatus::SleepDanger => "Danger! Serious signs of fatigue in your driving.",
        }
    }

    /// Driver-facing warning logged when entering this status
    pub fn driver_warning(&self) -> Option<&'static str> {
        match self {
            FatigueStatus::Normal => None,
            FatigueStatus::YawnWarning => {
                Some("Yawn detected. Please be alert and stop in case of fatigue.")
            }
            FatigueStatus::SleepDanger => Some(
                "Attention! Serious signs of fatigue have been detected in your driving. \
                 Please consider stopping in a safe place and taking a break.",
            ),
        }
    }

    pub fn is_alert(&self) -> bool {
        *self != FatigueStatus::Normal
    }
}

impl fmt::Display for FatigueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FatigueStatus::Normal => "normal",
            FatigueStatus::YawnWarning => "yawn_warning",
            FatigueStatus::SleepDanger => "sleep_danger",
        };
        f.write_str(name)
    }
}

/// Identity of a face tracked across consecutive frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face-{}", self.0)
    }
}

/// Per-face temporal state (tracked over consecutive frames)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceTrackState {
    /// When an eye was first seen closed in the current closure run
    pub eye_closed_since: Option<Instant>,

    /// Current status
    pub status: FatigueStatus,

    /// When `status` last changed into a warning value
    pub status_activated_at: Option<Instant>,

    /// Consecutive ticks with the mouth above the yawn threshold
    pub yawn_frames: u32,
}

impl FaceTrackState {
    /// Whether the display window of the current status has run out.
    ///
    /// A state that never raised a warning has no window to wait for.
    pub fn display_expired(&self, now: Instant, window: Duration) -> bool {
        match self.status_activated_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) > window,
        }
    }

    pub(crate) fn activate(&mut self, status: FatigueStatus, now: Instant) {
        self.status = status;
        self.status_activated_at = Some(now);
    }
}
