//! Recorded landmark replay
//!
//! One JSON object per line:
//! `{"t": 0.066, "faces": [{"bbox": {...}, "landmarks": [{"x": .., "y": ..}, ...]}]}`.
//! `t` (seconds since start) is optional. Blank lines and lines starting
//! with `#` are ignored.

use dms::{DetectedFace, DmsError, LandmarkProvider};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::MonitorError;

/// One recorded frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    #[serde(default)]
    pub faces: Vec<DetectedFace>,
}

/// Reads recorded frames line by line
pub struct ReplaySource<R> {
    lines: io::Lines<R>,
    line: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, MonitorError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MonitorError::ResourceNotFound(path.to_path_buf()),
            _ => MonitorError::Io(e),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Next frame, or `None` at end of input
    pub fn next_frame(&mut self) -> Result<Option<RecordedFrame>, MonitorError> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|source| MonitorError::Replay {
                    line: self.line,
                    source,
                });
        }
        Ok(None)
    }

    /// Line number of the last frame read
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Landmark provider over recorded frames
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedLandmarks;

impl LandmarkProvider for RecordedLandmarks {
    type Frame = RecordedFrame;

    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<DetectedFace>, DmsError> {
        Ok(frame.faces.clone())
    }
}
