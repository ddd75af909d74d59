//! Eye aspect ratio and openness classification

use serde::{Deserialize, Serialize};

use crate::config::DmsConfig;
use crate::geometry::{distance, Point2D};

/// Tri-state openness of one eye
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeOpenness {
    Closed,
    Blinking,
    Open,
}

/// EAR together with its classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeReading {
    /// `None` when the corner distance collapsed
    pub ear: Option<f64>,
    pub openness: EyeOpenness,
}

/// Eye aspect ratio of six eye points.
///
/// Returns `None` when `2 * |p1 p6|` is at or below `epsilon`.
pub fn eye_aspect_ratio(eye: &[Point2D; 6], epsilon: f64) -> Option<f64> {
    let [p1, p2, p3, p4, p5, p6] = *eye;
    let vertical = distance(p2, p4) + distance(p3, p5);
    let horizontal = 2.0 * distance(p1, p6);
    if horizontal <= epsilon {
        return None;
    }
    Some(vertical / horizontal)
}

/// Classifies eyes with fixed open/blink thresholds
#[derive(Debug, Clone, Copy)]
pub struct EyeStateClassifier {
    open_threshold: f64,
    blink_threshold: f64,
    epsilon: f64,
}

impl EyeStateClassifier {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            open_threshold: config.ear_open_threshold,
            blink_threshold: config.ear_blink_threshold,
            epsilon: config.degenerate_epsilon,
        }
    }

    /// Map an EAR onto the tri-state scale
    pub fn classify_ratio(&self, ear: f64) -> EyeOpenness {
        if ear > self.open_threshold {
            EyeOpenness::Open
        } else if ear > self.blink_threshold {
            EyeOpenness::Blinking
        } else {
            EyeOpenness::Closed
        }
    }

    /// Compute and classify; a degenerate eye reads as closed
    pub fn read(&self, eye: &[Point2D; 6]) -> EyeReading {
        let ear = eye_aspect_ratio(eye, self.epsilon);
        let openness = match ear {
            Some(ear) => self.classify_ratio(ear),
            None => EyeOpenness::Closed,
        };
        EyeReading { ear, openness }
    }
}

impl Default for EyeStateClassifier {
    fn default() -> Self {
        Self::new(&DmsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::synthetic;
    use proptest::prelude::*;

    /// Circle of radius `r` sampled at the contour angles
    fn circle_eye(r: f64) -> [Point2D; 6] {
        let at = |deg: f64| {
            let rad = deg.to_radians();
            Point2D::new(r * rad.cos(), r * rad.sin())
        };
        [at(180.0), at(120.0), at(60.0), at(240.0), at(300.0), at(0.0)]
    }

    #[test]
    fn test_circle_ear() {
        let ear = eye_aspect_ratio(&circle_eye(10.0), 1e-6).unwrap();
        assert!((ear - 3f64.sqrt() / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_boundaries() {
        let classifier = EyeStateClassifier::default();
        assert_eq!(classifier.classify_ratio(0.25), EyeOpenness::Blinking);
        assert_eq!(classifier.classify_ratio(0.2500001), EyeOpenness::Open);
        assert_eq!(classifier.classify_ratio(0.23), EyeOpenness::Blinking);
        assert_eq!(classifier.classify_ratio(0.21), EyeOpenness::Closed);
        assert_eq!(classifier.classify_ratio(0.2100001), EyeOpenness::Blinking);
        assert_eq!(classifier.classify_ratio(0.0), EyeOpenness::Closed);
    }

    #[test]
    fn test_synthetic_eyes() {
        let classifier = EyeStateClassifier::default();
        assert_eq!(classifier.read(&synthetic::eye(0.9)).openness, EyeOpenness::Open);
        assert_eq!(classifier.read(&synthetic::eye(0.23)).openness, EyeOpenness::Blinking);
        assert_eq!(classifier.read(&synthetic::eye(0.15)).openness, EyeOpenness::Closed);
    }

    #[test]
    fn test_degenerate_eye_reads_closed() {
        let classifier = EyeStateClassifier::default();
        let p = Point2D::new(5.0, 5.0);
        let eye = [p, Point2D::new(5.0, 7.0), Point2D::new(5.0, 7.0), Point2D::new(5.0, 3.0), Point2D::new(5.0, 3.0), p];
        let reading = classifier.read(&eye);
        assert_eq!(reading.ear, None);
        assert_eq!(reading.openness, EyeOpenness::Closed);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = DmsConfig {
            ear_open_threshold: 0.3,
            ear_blink_threshold: 0.2,
            ..Default::default()
        };
        let classifier = EyeStateClassifier::new(&config);
        assert_eq!(classifier.classify_ratio(0.28), EyeOpenness::Blinking);
    }

    proptest! {
        #[test]
        fn prop_ear_scale_invariant(r in 0.5f64..50.0, factor in 0.01f64..100.0) {
            let eye = circle_eye(r);
            let scaled = eye.map(|p| p.scale(factor));
            let a = eye_aspect_ratio(&eye, 1e-9).unwrap();
            let b = eye_aspect_ratio(&scaled, 1e-9).unwrap();
            prop_assert!((a - b).abs() < 1e-9);
        }

        #[test]
        fn prop_openness_monotonic(a in 0.0f64..1.0, b in 0.0f64..1.0) {
            let classifier = EyeStateClassifier::default();
            let rank = |o: EyeOpenness| match o {
                EyeOpenness::Closed => 0,
                EyeOpenness::Blinking => 1,
                EyeOpenness::Open => 2,
            };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rank(classifier.classify_ratio(lo)) <= rank(classifier.classify_ratio(hi)));
        }
    }
}
