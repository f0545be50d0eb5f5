//! Facial Feature Engine
//!
//! Derives geometric attention signals from facial landmarks:
//! - Eye aspect ratio (openness) per eye
//! - Horizontal head deviation relative to the eye line
//! - Frame-to-frame nose displacement

mod eye;
mod head;
mod motion;
mod point;

pub use eye::{eye_aspect_ratio, EyeOpenness, MIN_EYE_LANDMARKS};
pub use head::HeadDeviation;
pub use motion::{nose_displacement, MotionSample};
pub use point::{centroid, Point};
