//! 68-point facial landmark sets

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::geometry::Point2D;
use crate::DmsError;

/// Points per face in the 68-point annotation scheme
pub const LANDMARK_COUNT: usize = 68;

/// Left eye, ordered as the `p1..p6` arguments of the EAR formula
pub const LEFT_EYE: [usize; 6] = [36, 37, 38, 41, 40, 39];

/// Right eye, ordered as the `p1..p6` arguments of the EAR formula
pub const RIGHT_EYE: [usize; 6] = [42, 43, 44, 47, 46, 45];

/// Outer and inner lip contour
pub const MOUTH: Range<usize> = 48..68;

/// Exactly 68 landmarks of one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2D>", into = "Vec<Point2D>")]
pub struct LandmarkSet {
    points: Vec<Point2D>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point2D>) -> Result<Self, DmsError> {
        if points.len() != LANDMARK_COUNT {
            return Err(DmsError::InvalidInput {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn left_eye(&self) -> [Point2D; 6] {
        LEFT_EYE.map(|i| self.points[i])
    }

    pub fn right_eye(&self) -> [Point2D; 6] {
        RIGHT_EYE.map(|i| self.points[i])
    }

    pub fn mouth(&self) -> [Point2D; 20] {
        let mut mouth = [Point2D::default(); 20];
        mouth.copy_from_slice(&self.points[MOUTH]);
        mouth
    }
}

impl TryFrom<Vec<Point2D>> for LandmarkSet {
    type Error = DmsError;

    fn try_from(points: Vec<Point2D>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<LandmarkSet> for Vec<Point2D> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}
