//! Mouth aspect ratio

use crate::config::DmsConfig;
use crate::geometry::{distance, Point2D};

/// Computes the mouth aspect ratio from the 20 lip landmarks
#[derive(Debug, Clone, Copy)]
pub struct MouthRatioCalculator {
    epsilon: f64,
}

impl MouthRatioCalculator {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            epsilon: config.degenerate_epsilon,
        }
    }

    /// MAR over the lip contour; a collapsed corner distance reads as wide open
    pub fn ratio(&self, mouth: &[Point2D; 20]) -> f64 {
        let a = distance(mouth[2], mouth[10]);
        let b = distance(mouth[4], mouth[8]);
        let c = 2.0 * distance(mouth[0], mouth[6]);
        if c <= self.epsilon {
            return f64::INFINITY;
        }
        (a + b) / c
    }
}

impl Default for MouthRatioCalculator {
    fn default() -> Self {
        Self::new(&DmsConfig::default())
    }
}
