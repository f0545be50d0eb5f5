//! Nose motion between ticks

use crate::point::Point;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Euclidean nose displacement since the previous tick, `None` on the first tick
pub fn nose_displacement(previous: Option<Point>, current: Point) -> Option<f32> {
    previous.map(|prev| prev.distance(&current))
}

/// Motion measurement relative to frame width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Displacement in pixels
    pub displacement: f32,
    /// Width of the source frame in pixels
    pub frame_width: f32,
}

impl MotionSample {
    /// Build a sample; `None` when there is no previous position
    pub fn measure(previous: Option<Point>, current: Point, frame_width: f32) -> Option<Self> {
        let displacement = nose_displacement(previous, current)?;
        trace!(displacement, frame_width, "nose displacement");
        Some(Self {
            displacement,
            frame_width,
        })
    }

    /// Movement exceeds `ratio` of the frame width
    pub fn is_burst(&self, ratio: f32) -> bool {
        self.displacement > self.frame_width * ratio
    }
}
