//! Collaborators the monitor drives: landmark source, clock and alarm output

use alerting::AlarmKind;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::geometry::{FaceBbox, Point2D};
use crate::DmsError;

/// One face as delivered by a landmark provider
///
/// Landmarks are unchecked here; the monitor validates the point count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub bbox: FaceBbox,
    pub landmarks: Vec<Point2D>,
}

/// Face detection plus 68-point landmark extraction
pub trait LandmarkProvider {
    type Frame;

    /// Zero or more faces found in `frame`
    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<DetectedFace>, DmsError>;
}

/// Monotonic time source, sampled once per tick
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock-backed monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Instant) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Audible alarm output, fire-and-forget
pub trait AlarmPlayer {
    fn play(&mut self, kind: AlarmKind);
}

/// Alarm player that only remembers what it was asked to play
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingPlayer {
    pub played: Vec<AlarmKind>,
}

#[cfg(test)]
impl AlarmPlayer for RecordingPlayer {
    fn play(&mut self, kind: AlarmKind) {
        self.played.push(kind);
    }
}
