//! Horizontal head deviation
//!
//! Compares the nose tip against the eye line to tell whether the head is
//! turned away from the camera.

use crate::eye::MIN_EYE_LANDMARKS;
use crate::point::{centroid, Point};
use serde::{Deserialize, Serialize};

/// Head deviation measurements for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadDeviation {
    /// Centroid of the left eye contour
    pub left_eye_center: Point,
    /// Centroid of the right eye contour
    pub right_eye_center: Point,
    /// Midpoint between both eye centroids
    pub eyes_center: Point,
    /// Distance between the outer eye corners along x
    pub face_width: f32,
    /// |nose.x - eyes_center.x|
    pub horizontal_deviation: f32,
    /// |nose.x - left_eye_center.x|
    pub left_offset: f32,
    /// |nose.x - right_eye_center.x|
    pub right_offset: f32,
}

impl HeadDeviation {
    /// Measure deviation; `None` if either eye contour is malformed
    pub fn measure(left_eye: &[Point], right_eye: &[Point], nose_tip: Point) -> Option<Self> {
        if left_eye.len() < MIN_EYE_LANDMARKS || right_eye.len() < MIN_EYE_LANDMARKS {
            return None;
        }

        let left_eye_center = centroid(left_eye)?;
        let right_eye_center = centroid(right_eye)?;
        let eyes_center = left_eye_center.midpoint(&right_eye_center);

        Some(Self {
            left_eye_center,
            right_eye_center,
            eyes_center,
            face_width: (right_eye[3].x - left_eye[0].x).abs(),
            horizontal_deviation: (nose_tip.x - eyes_center.x).abs(),
            left_offset: (nose_tip.x - left_eye_center.x).abs(),
            right_offset: (nose_tip.x - right_eye_center.x).abs(),
        })
    }

    /// Nose is off the eye midline by more than `ratio` of the face width
    pub fn is_turned(&self, ratio: f32) -> bool {
        self.horizontal_deviation > self.face_width * ratio
    }

    /// Nose sits within `min_offset` of either eye centre (extreme profile)
    pub fn is_degenerate(&self, min_offset: f32) -> bool {
        self.left_offset < min_offset || self.right_offset < min_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye(cx: f32) -> Vec<Point> {
        vec![
            Point::new(cx - 20.0, 100.0),
            Point::new(cx - 7.0, 94.0),
            Point::new(cx + 7.0, 94.0),
            Point::new(cx + 20.0, 100.0),
            Point::new(cx + 7.0, 106.0),
            Point::new(cx - 7.0, 106.0),
        ]
    }

    #[test]
    fn test_frontal_face() {
        let dev = HeadDeviation::measure(&eye(100.0), &eye(200.0), Point::new(150.0, 140.0)).unwrap();
        assert!((dev.face_width - 140.0).abs() < 1e-4);
        assert!(dev.horizontal_deviation.abs() < 1e-4);
        assert!(!dev.is_turned(0.10));
        assert!(!dev.is_degenerate(20.0));
    }

    #[test]
    fn test_turned_head() {
        // 20 px off centre > 14 px (10% of 140)
        let dev = HeadDeviation::measure(&eye(100.0), &eye(200.0), Point::new(170.0, 140.0)).unwrap();
        assert!(dev.is_turned(0.10));
        assert!(!dev.is_degenerate(20.0));
    }

    #[test]
    fn test_degenerate_profile() {
        let dev = HeadDeviation::measure(&eye(100.0), &eye(200.0), Point::new(190.0, 140.0)).unwrap();
        assert!(dev.is_turned(0.10));
        assert!(dev.is_degenerate(20.0));
    }

    #[test]
    fn test_malformed_landmarks() {
        let short = &eye(100.0)[..4];
        assert!(HeadDeviation::measure(short, &eye(200.0), Point::new(150.0, 140.0)).is_none());
    }
}
