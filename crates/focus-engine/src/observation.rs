//! Per-tick detector observations

use crate::emotion::ExpressionScores;
use feature_engine::Point;
use serde::{Deserialize, Serialize};

/// Face bounding box in frame pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Primary face reported by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub bounding_box: BoundingBox,
    /// Left eye contour, six or more ordered points
    pub left_eye: Vec<Point>,
    /// Right eye contour, six or more ordered points
    pub right_eye: Vec<Point>,
    pub nose_tip: Point,
    /// Expression probabilities in [0, 1]
    pub expressions: ExpressionScores,
    /// Width of the source frame (pixels), scales the motion threshold
    pub frame_width: f32,
}

/// Result of one detection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameObservation {
    NoFace,
    Face(FaceObservation),
}

impl FrameObservation {
    pub fn face(&self) -> Option<&FaceObservation> {
        match self {
            FrameObservation::Face(face) => Some(face),
            FrameObservation::NoFace => None,
        }
    }

    pub fn is_face(&self) -> bool {
        matches!(self, FrameObservation::Face(_))
    }
}

impl From<FaceObservation> for FrameObservation {
    fn from(face: FaceObservation) -> Self {
        FrameObservation::Face(face)
    }
}
