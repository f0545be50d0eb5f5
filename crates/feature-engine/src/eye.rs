//! Eye aspect ratio (EAR)
//!
//! Landmark order follows the 68-point convention: `p0` and `p3` are the eye
//! corners, `p1`/`p2` the upper lid and `p4`/`p5` the lower lid.

use crate::point::Point;
use serde::{Deserialize, Serialize};

/// Minimum landmark count for an eye contour
pub const MIN_EYE_LANDMARKS: usize = 6;

/// Openness ratio of a single eye.
///
/// Returns `None` for malformed contours (fewer than six points) and `0.0`
/// when the corner distance is zero.
pub fn eye_aspect_ratio(eye: &[Point]) -> Option<f32> {
    if eye.len() < MIN_EYE_LANDMARKS {
        return None;
    }

    let vertical = eye[1].distance(&eye[5]);
    let horizontal = eye[0].distance(&eye[3]);

    if horizontal == 0.0 {
        Some(0.0)
    } else {
        Some(vertical / horizontal)
    }
}

/// Openness of both eyes for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeOpenness {
    pub left: f32,
    pub right: f32,
}

impl EyeOpenness {
    /// Measure both eyes; `None` if either contour is malformed
    pub fn measure(left_eye: &[Point], right_eye: &[Point]) -> Option<Self> {
        Some(Self {
            left: eye_aspect_ratio(left_eye)?,
            right: eye_aspect_ratio(right_eye)?,
        })
    }

    /// Mean ratio over both eyes
    pub fn average(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    /// Eyes count as closed when the mean ratio falls below `threshold`
    pub fn is_closed(&self, threshold: f32) -> bool {
        self.average() < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn eye(cx: f32, width: f32, height: f32) -> Vec<Point> {
        let (hw, hh) = (width / 2.0, height / 2.0);
        vec![
            Point::new(cx - hw, 0.0),
            Point::new(cx - width / 6.0, -hh),
            Point::new(cx + width / 6.0, -hh),
            Point::new(cx + hw, 0.0),
            Point::new(cx + width / 6.0, hh),
            Point::new(cx - width / 6.0, hh),
        ]
    }

    #[test]
    fn test_ratio() {
        let ear = eye_aspect_ratio(&eye(0.0, 40.0, 12.0)).unwrap();
        assert!((ear - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_contour() {
        let short = &eye(0.0, 40.0, 12.0)[..5];
        assert!(eye_aspect_ratio(short).is_none());
        assert!(EyeOpenness::measure(short, &eye(100.0, 40.0, 12.0)).is_none());
    }

    #[test]
    fn test_zero_width_eye() {
        let flat = vec![Point::default(); 6];
        assert_eq!(eye_aspect_ratio(&flat), Some(0.0));
    }

    #[test]
    fn test_closed_threshold() {
        let open = EyeOpenness::measure(&eye(0.0, 40.0, 12.0), &eye(100.0, 40.0, 12.0)).unwrap();
        assert!(!open.is_closed(0.25));

        let closed = EyeOpenness::measure(&eye(0.0, 40.0, 4.0), &eye(100.0, 40.0, 4.0)).unwrap();
        assert!((closed.average() - 0.1).abs() < 1e-6);
        assert!(closed.is_closed(0.25));
    }

    fn contour() -> impl Strategy<Value = Vec<Point>> {
        prop::collection::vec((-500.0f32..500.0, -500.0f32..500.0), 6..10)
            .prop_map(|pts| pts.into_iter().map(Point::from).collect())
    }

    proptest! {
        #[test]
        fn test_ratio_is_non_negative(eye in contour()) {
            let ear = eye_aspect_ratio(&eye).unwrap();
            prop_assert!(ear >= 0.0);
        }

        #[test]
        fn test_average_ignores_eye_order(left in contour(), right in contour()) {
            let a = EyeOpenness::measure(&left, &right).unwrap();
            let b = EyeOpenness::measure(&right, &left).unwrap();
            prop_assert_eq!(a.average(), b.average());
            prop_assert_eq!(a.is_closed(0.25), b.is_closed(0.25));
        }
    }
}
