//! Driver Monitoring System (DMS)
//!
//! Fatigue detection from 68-point facial landmarks:
//! - Eye aspect ratio and tri-state eye openness
//! - Mouth aspect ratio (yawning)
//! - Sustained eye closure and yawn state machine per face
//! - Debounced audible alarms

pub mod analysis;
pub mod config;
pub mod eye;
pub mod geometry;
pub mod landmarks;
pub mod machine;
pub mod mouth;
pub mod provider;
pub mod state;
pub mod tracker;

pub use alerting::AlarmKind;
pub use analysis::{FaceAnalysis, FrameAnalysis};
pub use config::DmsConfig;
pub use eye::{EyeOpenness, EyeReading, EyeStateClassifier};
pub use geometry::{FaceBbox, Point2D};
pub use landmarks::LandmarkSet;
pub use machine::{FaceSignals, FatigueStateMachine, TickOutcome};
pub use mouth::MouthRatioCalculator;
pub use provider::{AlarmPlayer, Clock, DetectedFace, LandmarkProvider, MonotonicClock};
pub use state::{FaceId, FaceTrackState, FatigueStatus, Rgb};
pub use tracker::FaceTracker;

use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Invalid landmark set: expected {expected} points, got {actual}")]
    InvalidInput { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Landmark provider failed: {0}")]
    Provider(String),
}

/// Frame-level fatigue monitor
pub struct FatigueMonitor {
    eye_classifier: EyeStateClassifier,
    mouth: MouthRatioCalculator,
    tracker: FaceTracker,
    machine: FatigueStateMachine,
}

impl FatigueMonitor {
    /// Create a monitor with a validated configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            eye_classifier: EyeStateClassifier::new(&config),
            mouth: MouthRatioCalculator::new(&config),
            tracker: FaceTracker::new(config.face_match_iou),
            machine: FatigueStateMachine::new(&config),
        })
    }

    /// Pull one frame through the provider and evaluate it at a single
    /// clock sample
    pub fn process_frame<P, C, A>(
        &mut self,
        provider: &mut P,
        frame: &P::Frame,
        clock: &C,
        player: &mut A,
    ) -> Result<FrameAnalysis, DmsError>
    where
        P: LandmarkProvider,
        C: Clock,
        A: AlarmPlayer,
    {
        let faces = provider.detect(frame)?;
        let now = clock.now();
        Ok(self.process(faces, now, player))
    }

    /// Evaluate the faces detected in one frame
    pub fn process<A: AlarmPlayer>(
        &mut self,
        faces: Vec<DetectedFace>,
        now: Instant,
        player: &mut A,
    ) -> FrameAnalysis {
        if faces.is_empty() {
            return FrameAnalysis::default();
        }

        let boxes: Vec<FaceBbox> = faces.iter().map(|f| f.bbox).collect();
        let association = self.tracker.associate(&boxes);
        for id in &association.dropped {
            self.machine.forget(*id);
        }

        let mut analysis = FrameAnalysis::default();
        for (face, face_id) in faces.into_iter().zip(association.ids) {
            let landmarks = match LandmarkSet::new(face.landmarks) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    warn!(face = %face_id, "Skipping face: {}", e);
                    analysis.skipped_faces += 1;
                    continue;
                }
            };

            let left_eye = self.eye_classifier.read(&landmarks.left_eye());
            let right_eye = self.eye_classifier.read(&landmarks.right_eye());
            let mar = self.mouth.ratio(&landmarks.mouth());
            let signals = FaceSignals {
                left_eye: left_eye.openness,
                right_eye: right_eye.openness,
                mar,
            };

            let outcome = self.machine.tick(face_id, &signals, now);
            for kind in &outcome.alarms {
                player.play(*kind);
            }

            let yawn_frames = self
                .machine
                .state(face_id)
                .map(|s| s.yawn_frames)
                .unwrap_or_default();

            debug!(
                face = %face_id,
                left_ear = ?left_eye.ear,
                right_ear = ?right_eye.ear,
                mar,
                status = %outcome.status,
                "Tick"
            );

            analysis.faces.push(FaceAnalysis {
                face_id,
                bbox: face.bbox,
                left_eye,
                right_eye,
                mar,
                yawn_frames,
                status: outcome.status,
                color: outcome.status.display_color(),
                message: outcome.status.message().to_string(),
                alarms: outcome.alarms,
            });
        }

        analysis
    }

    /// Current state of a tracked face
    pub fn face_state(&self, face: FaceId) -> Option<&FaceTrackState> {
        self.machine.state(face)
    }

    /// Number of faces currently tracked
    pub fn tracked_faces(&self) -> usize {
        self.tracker.track_count()
    }
}
