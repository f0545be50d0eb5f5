//! Distraction aggregation
//!
//! Penalties are additive and tuned independently; the sum is clamped to
//! 0-100 and mapped through a logistic curve so a single borderline signal
//! moves the score gently while several strong ones saturate it towards 0.

use crate::analysis::DistractionBreakdown;
use crate::emotion::EmotionReading;
use crate::observation::FaceObservation;
use crate::state::SessionState;
use crate::EngineConfig;
use feature_engine::{EyeOpenness, HeadDeviation, MotionSample};
use tracing::{debug, trace};

/// Map a distraction level (0-100) to a focus score (0-100)
pub fn focus_from_distraction(distraction: u8, steepness: f64, midpoint: f64) -> u8 {
    let raw = 100.0 - f64::from(distraction.min(100));
    let score = 100.0 / (1.0 + (-steepness * (raw - midpoint)).exp());
    score.floor().clamp(0.0, 100.0) as u8
}

/// Fuses per-tick signals into distraction and focus
#[derive(Debug, Clone)]
pub struct DistractionAggregator {
    config: EngineConfig,
}

impl DistractionAggregator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Score a face tick and store the outcome in `state`
    pub fn apply_face(
        &self,
        state: &mut SessionState,
        face: &FaceObservation,
        emotion: EmotionReading,
    ) -> DistractionBreakdown {
        let cfg = &self.config;
        let mut breakdown = DistractionBreakdown {
            emotion_weight: emotion.weight,
            volatility_bonus: emotion.volatility_bonus,
            ..Default::default()
        };

        match EyeOpenness::measure(&face.left_eye, &face.right_eye) {
            Some(eyes) => {
                breakdown.eye_aspect_ratio = Some(eyes.average());
                if eyes.is_closed(cfg.ear_threshold) {
                    breakdown.closed_eyes = cfg.closed_eyes_penalty;
                    breakdown.attention_shifts += 1;
                }
            }
            None => trace!("Eye landmarks malformed, skipping eye closure"),
        }

        match HeadDeviation::measure(&face.left_eye, &face.right_eye, face.nose_tip) {
            Some(head) => {
                if head.is_turned(cfg.head_deviation_ratio) {
                    breakdown.head_deviation = cfg.head_deviation_penalty;
                    breakdown.attention_shifts += 1;
                }
                if head.is_degenerate(cfg.degenerate_offset_px) {
                    breakdown.degenerate_pose = cfg.degenerate_penalty;
                }
            }
            None => trace!("Eye landmarks malformed, skipping head deviation"),
        }

        if let Some(motion) =
            MotionSample::measure(state.previous_nose_position, face.nose_tip, face.frame_width)
        {
            if motion.is_burst(cfg.motion_ratio) {
                breakdown.motion = cfg.motion_penalty;
                breakdown.attention_shifts += 1;
            }
        }
        state.previous_nose_position = Some(face.nose_tip);

        let distraction = breakdown.level();
        let focus = focus_from_distraction(distraction, cfg.sigmoid_steepness, cfg.sigmoid_midpoint);

        for _ in 0..breakdown.attention_shifts {
            state.record_attention_shift();
        }
        state.consecutive_missed_frames = 0;
        state.face_detected = true;
        state.dominant_emotion = emotion.label;
        state.distraction_level = distraction;
        state.focus_score = focus;

        debug!(
            emotion = %emotion.label,
            distraction,
            focus,
            shifts = state.attention_shift_count,
            "Face tick scored"
        );

        breakdown
    }

    /// Register a tick without a face; decays focus once the face is lost
    pub fn apply_missed(&self, state: &mut SessionState) {
        state.consecutive_missed_frames = state.consecutive_missed_frames.saturating_add(1);

        if state.consecutive_missed_frames >= self.config.missed_frame_threshold {
            if state.face_detected {
                debug!(
                    missed = state.consecutive_missed_frames,
                    "Face lost after consecutive missed detections"
                );
            }
            state.face_detected = false;
            state.focus_score = state.focus_score.saturating_sub(self.config.missed_frame_decay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{EmotionLabel, ExpressionScores};
    use crate::observation::BoundingBox;
    use feature_engine::Point;
    use proptest::prelude::*;

    fn eye(cx: f32, openness: f32) -> Vec<Point> {
        // 40 px wide, so EAR = openness / 40
        let h = openness / 2.0;
        vec![
            Point::new(cx - 20.0, 100.0),
            Point::new(cx - 7.0, 100.0 - h),
            Point::new(cx + 7.0, 100.0 - h),
            Point::new(cx + 20.0, 100.0),
            Point::new(cx + 7.0, 100.0 + h),
            Point::new(cx - 7.0, 100.0 + h),
        ]
    }

    fn face(nose_x: f32, eye_height: f32) -> FaceObservation {
        FaceObservation {
            bounding_box: BoundingBox {
                x: 60.0,
                y: 60.0,
                width: 180.0,
                height: 200.0,
            },
            left_eye: eye(100.0, eye_height),
            right_eye: eye(200.0, eye_height),
            nose_tip: Point::new(nose_x, 140.0),
            expressions: ExpressionScores::new(),
            frame_width: 640.0,
        }
    }

    fn reading(label: EmotionLabel) -> EmotionReading {
        EmotionReading {
            label,
            weight: label.distraction_weight(),
            volatility_bonus: 0,
        }
    }

    #[test]
    fn test_sigmoid_anchor_points() {
        assert_eq!(focus_from_distraction(0, 0.1, 50.0), 99);
        assert_eq!(focus_from_distraction(10, 0.1, 50.0), 98);
        assert_eq!(focus_from_distraction(50, 0.1, 50.0), 50);
        assert_eq!(focus_from_distraction(100, 0.1, 50.0), 0);
    }

    #[test]
    fn test_attentive_face() {
        let agg = DistractionAggregator::new(EngineConfig::default());
        let mut state = SessionState::default();

        let breakdown = agg.apply_face(&mut state, &face(150.0, 12.0), reading(EmotionLabel::Neutral));

        assert_eq!(breakdown.unclamped(), 10);
        assert_eq!(state.distraction_level, 10);
        assert_eq!(state.focus_score(), 98);
        assert_eq!(state.attention_shift_count(), 0);
        assert!(state.face_detected);
    }

    #[test]
    fn test_closed_eyes_add_fifty_and_one_shift() {
        let agg = DistractionAggregator::new(EngineConfig::default());

        let mut open_state = SessionState::default();
        let open = agg.apply_face(&mut open_state, &face(150.0, 12.0), reading(EmotionLabel::Neutral));

        let mut closed_state = SessionState::default();
        // EAR = 4 / 40 = 0.10
        let closed = agg.apply_face(&mut closed_state, &face(150.0, 4.0), reading(EmotionLabel::Neutral));

        assert!((closed.eye_aspect_ratio.unwrap() - 0.10).abs() < 1e-6);
        assert_eq!(closed.unclamped(), open.unclamped() + 50);
        assert_eq!(closed_state.attention_shift_count(), open_state.attention_shift_count() + 1);
        assert!(closed_state.focus_score() < open_state.focus_score());
    }

    #[test]
    fn test_head_penalties_are_independent() {
        let agg = DistractionAggregator::new(EngineConfig::default());

        let mut state = SessionState::default();
        let turned = agg.apply_face(&mut state, &face(170.0, 12.0), reading(EmotionLabel::Neutral));
        assert_eq!(turned.head_deviation, 25);
        assert_eq!(turned.degenerate_pose, 0);
        assert_eq!(state.attention_shift_count(), 1);

        let mut state = SessionState::default();
        let profile = agg.apply_face(&mut state, &face(190.0, 12.0), reading(EmotionLabel::Neutral));
        assert_eq!(profile.head_deviation, 25);
        assert_eq!(profile.degenerate_pose, 60);
        assert_eq!(profile.level(), 95);
        // The degenerate-pose penalty is not an attention shift
        assert_eq!(state.attention_shift_count(), 1);
    }

    #[test]
    fn test_motion_burst() {
        let agg = DistractionAggregator::new(EngineConfig::default());
        let mut state = SessionState::default();

        let first = agg.apply_face(&mut state, &face(150.0, 12.0), reading(EmotionLabel::Neutral));
        assert_eq!(first.motion, 0);

        // Shift every landmark 30 px right: 30 > 19.2 (3% of 640)
        let mut moved = face(180.0, 12.0);
        moved.left_eye = eye(130.0, 12.0);
        moved.right_eye = eye(230.0, 12.0);
        let second = agg.apply_face(&mut state, &moved, reading(EmotionLabel::Neutral));
        assert_eq!(second.motion, 15);
        assert_eq!(second.head_deviation, 0);
        assert_eq!(state.attention_shift_count(), 1);
        assert_eq!(state.previous_nose_position, Some(Point::new(180.0, 140.0)));

        let third = agg.apply_face(&mut state, &moved, reading(EmotionLabel::Neutral));
        assert_eq!(third.motion, 0);
    }

    #[test]
    fn test_malformed_landmarks_contribute_nothing() {
        let agg = DistractionAggregator::new(EngineConfig::default());
        let mut state = SessionState::default();
        let mut obs = face(190.0, 4.0);
        obs.left_eye.truncate(3);

        let breakdown = agg.apply_face(&mut state, &obs, reading(EmotionLabel::Happy));
        assert_eq!(breakdown.eye_aspect_ratio, None);
        assert_eq!(breakdown.unclamped(), 20);
        assert_eq!(state.attention_shift_count(), 0);
    }

    #[test]
    fn test_missed_frames_decay_on_tenth_tick() {
        let agg = DistractionAggregator::new(EngineConfig::default());
        let mut state = SessionState::default();
        agg.apply_face(&mut state, &face(150.0, 12.0), reading(EmotionLabel::Neutral));
        let before = state.focus_score();

        for _ in 0..9 {
            agg.apply_missed(&mut state);
        }
        assert!(state.face_detected);
        assert_eq!(state.focus_score(), before);

        agg.apply_missed(&mut state);
        assert!(!state.face_detected);
        assert_eq!(state.focus_score(), before - 10);

        agg.apply_face(&mut state, &face(150.0, 12.0), reading(EmotionLabel::Neutral));
        assert_eq!(state.consecutive_missed_frames, 0);
        assert!(state.face_detected);
    }

    #[test]
    fn test_decay_floors_at_zero() {
        let agg = DistractionAggregator::new(EngineConfig::default());
        let mut state = SessionState::new(10, 5);
        for _ in 0..12 {
            agg.apply_missed(&mut state);
        }
        assert_eq!(state.focus_score(), 0);
    }

    fn any_label() -> impl Strategy<Value = EmotionLabel> {
        proptest::sample::select(EmotionLabel::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn test_scores_stay_bounded(
            label in any_label(),
            bonus in 0u32..200,
            nose_x in 0.0f32..640.0,
            eye_height in 0.0f32..40.0,
            prev_x in proptest::option::of(0.0f32..640.0),
        ) {
            let agg = DistractionAggregator::new(EngineConfig::default());
            let mut state = SessionState::default();
            state.previous_nose_position = prev_x.map(|x| Point::new(x, 140.0));
            let emotion = EmotionReading { label, weight: label.distraction_weight(), volatility_bonus: bonus };

            agg.apply_face(&mut state, &face(nose_x, eye_height), emotion);

            prop_assert!(state.focus_score() <= 100);
            prop_assert!(state.distraction_level <= 100);
        }

        #[test]
        fn test_heavier_emotion_never_raises_focus(
            a in any_label(),
            b in any_label(),
            nose_x in 0.0f32..640.0,
            eye_height in 0.0f32..40.0,
        ) {
            let (light, heavy) = if a.distraction_weight() <= b.distraction_weight() { (a, b) } else { (b, a) };
            let agg = DistractionAggregator::new(EngineConfig::default());

            let mut light_state = SessionState::default();
            agg.apply_face(&mut light_state, &face(nose_x, eye_height), reading(light));
            let mut heavy_state = SessionState::default();
            agg.apply_face(&mut heavy_state, &face(nose_x, eye_height), reading(heavy));

            prop_assert!(heavy_state.focus_score() <= light_state.focus_score());
        }
    }
}
