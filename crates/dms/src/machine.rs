//! Fatigue state machine
//!
//! One [`FaceTrackState`] per tracked face, advanced once per tick with the
//! eye and mouth readings of that face. Transitions into a warning status
//! request an alarm from the shared [`AlarmDebouncer`].

use alerting::{AlarmDebouncer, AlarmKind};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::DmsConfig;
use crate::eye::EyeOpenness;
use crate::state::{FaceId, FaceTrackState, FatigueStatus};

/// Classifier outputs for one face in one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSignals {
    pub left_eye: EyeOpenness,
    pub right_eye: EyeOpenness,
    pub mar: f64,
}

impl FaceSignals {
    /// Closure timer condition. Only `Closed` counts; a blinking eye is open.
    pub fn eyes_closed(&self) -> bool {
        self.left_eye == EyeOpenness::Closed || self.right_eye == EyeOpenness::Closed
    }
}

/// Result of one tick for one face
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickOutcome {
    /// Status after the tick
    pub status: FatigueStatus,
    /// Warning statuses entered during the tick, in evaluation order
    pub entered: Vec<FatigueStatus>,
    /// Alarms that passed the debouncer and should be played
    pub alarms: Vec<AlarmKind>,
    /// Whether the face decayed back to normal this tick
    pub recovered: bool,
}

/// Alarm that accompanies entering `status`
pub fn alarm_for(status: FatigueStatus) -> Option<AlarmKind> {
    match status {
        FatigueStatus::Normal => None,
        FatigueStatus::YawnWarning => Some(AlarmKind::Yawn),
        FatigueStatus::SleepDanger => Some(AlarmKind::Sleep),
    }
}

/// Threshold and timing parameters of the transition rules
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub yawn: f64,
    pub eye_closed: Duration,
    pub display: Duration,
}

impl From<&DmsConfig> for Thresholds {
    fn from(config: &DmsConfig) -> Self {
        Self {
            yawn: config.yawn_threshold,
            eye_closed: config.eye_closed_duration(),
            display: config.alarm_display_duration(),
        }
    }
}

impl Thresholds {
    /// Apply the transition rules to one face and return the warning
    /// statuses entered, in order.
    ///
    /// Eye closure is evaluated before the yawn check, so a tick meeting
    /// both conditions enters `SleepDanger` and then `YawnWarning`, ending
    /// in `YawnWarning`.
    pub fn advance(
        &self,
        state: &mut FaceTrackState,
        signals: &FaceSignals,
        now: Instant,
    ) -> Vec<FatigueStatus> {
        let mut entered = Vec::new();
        let eyes_closed = signals.eyes_closed();
        let yawning = signals.mar > self.yawn;

        if eyes_closed {
            match state.eye_closed_since {
                None => state.eye_closed_since = Some(now),
                Some(since) => {
                    if now.saturating_duration_since(since) > self.eye_closed
                        && state.status != FatigueStatus::SleepDanger
                    {
                        state.activate(FatigueStatus::SleepDanger, now);
                        entered.push(FatigueStatus::SleepDanger);
                    }
                }
            }
        } else {
            state.eye_closed_since = None;
        }

        if yawning {
            state.yawn_frames = state.yawn_frames.saturating_add(1);
            if state.status != FatigueStatus::YawnWarning {
                state.activate(FatigueStatus::YawnWarning, now);
                entered.push(FatigueStatus::YawnWarning);
            }
        } else {
            state.yawn_frames = 0;
        }

        if !eyes_closed && !yawning && state.display_expired(now, self.display) {
            state.status = FatigueStatus::Normal;
        }

        entered
    }
}

/// Fatigue state machine over all tracked faces
pub struct FatigueStateMachine {
    thresholds: Thresholds,
    faces: HashMap<FaceId, FaceTrackState>,
    debouncer: AlarmDebouncer,
}

impl FatigueStateMachine {
    pub fn new(config: &DmsConfig) -> Self {
        let thresholds = Thresholds::from(config);
        Self {
            debouncer: AlarmDebouncer::new(thresholds.display),
            thresholds,
            faces: HashMap::new(),
        }
    }

    /// Advance `face` by one tick
    pub fn tick(&mut self, face: FaceId, signals: &FaceSignals, now: Instant) -> TickOutcome {
        let state = self.faces.entry(face).or_default();
        let previous = state.status;
        let entered = self.thresholds.advance(state, signals, now);
        let status = state.status;

        let mut alarms = Vec::new();
        for entered_status in &entered {
            if let Some(warning) = entered_status.driver_warning() {
                warn!(face = %face, status = %entered_status, "{}", warning);
            }
            if let Some(kind) = alarm_for(*entered_status) {
                if self.debouncer.try_fire(kind, now) {
                    alarms.push(kind);
                } else {
                    debug!(face = %face, "Alarm {} debounced", kind);
                }
            }
        }

        let recovered = previous.is_alert() && status == FatigueStatus::Normal;
        if recovered {
            info!(face = %face, "Status back to normal after {}", previous);
        }

        TickOutcome {
            status,
            entered,
            alarms,
            recovered,
        }
    }

    /// Current state of `face`
    pub fn state(&self, face: FaceId) -> Option<&FaceTrackState> {
        self.faces.get(&face)
    }

    /// Drop a face that left the scene
    pub fn forget(&mut self, face: FaceId) -> Option<FaceTrackState> {
        self.faces.remove(&face)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn debouncer(&self) -> &AlarmDebouncer {
        &self.debouncer
    }
}
