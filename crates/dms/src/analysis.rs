//! DMS analysis results

use alerting::AlarmKind;
use serde::{Deserialize, Serialize};

use crate::eye::EyeReading;
use crate::geometry::FaceBbox;
use crate::state::{FaceId, FatigueStatus, Rgb};

/// Per-face result of one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAnalysis {
    pub face_id: FaceId,
    pub bbox: FaceBbox,
    pub left_eye: EyeReading,
    pub right_eye: EyeReading,
    /// Mouth aspect ratio
    pub mar: f64,
    /// Consecutive yawning ticks
    pub yawn_frames: u32,
    pub status: FatigueStatus,
    pub color: Rgb,
    pub message: String,
    /// Alarms played this tick
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub alarms: Vec<AlarmKind>,
}

/// Complete result of one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Faces evaluated this tick
    pub faces: Vec<FaceAnalysis>,
    /// Faces skipped because their landmark set was malformed
    pub skipped_faces: usize,
}

impl FrameAnalysis {
    /// Whether any face was evaluated
    pub fn face_detected(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Most severe status across faces (`Normal` when there are none)
    pub fn most_severe(&self) -> FatigueStatus {
        self.faces
            .iter()
            .map(|f| f.status)
            .max()
            .unwrap_or_default()
    }

    /// Face showing the most severe status
    pub fn most_severe_face(&self) -> Option<&FaceAnalysis> {
        self.faces.iter().max_by_key(|f| f.status)
    }

    /// All alarms played this tick
    pub fn alarms(&self) -> impl Iterator<Item = AlarmKind> + '_ {
        self.faces.iter().flat_map(|f| f.alarms.iter().copied())
    }
}
