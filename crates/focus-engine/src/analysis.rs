//! Focus results and alerts

use crate::emotion::EmotionLabel;
use alerting::FocusAlert;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Live focus reading, recomputed every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusResult {
    /// Focus score (0-100, higher is better)
    pub focus_score: u8,
    /// Clamped distraction level (0-100, higher is worse)
    pub distraction_level: u8,
    pub dominant_emotion: EmotionLabel,
    pub face_detected: bool,
    pub attention_shift_count: u32,
}

/// Per-signal contributions to one face tick's distraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistractionBreakdown {
    /// Fixed weight of the dominant emotion
    pub emotion_weight: u32,
    pub volatility_bonus: u32,
    pub closed_eyes: u32,
    pub head_deviation: u32,
    pub degenerate_pose: u32,
    pub motion: u32,
    /// Mean eye aspect ratio (`None` when landmarks were malformed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_aspect_ratio: Option<f32>,
    /// Attention shifts recorded on this tick
    pub attention_shifts: u32,
}

impl DistractionBreakdown {
    /// Sum of all contributions before clamping
    pub fn unclamped(&self) -> u32 {
        [
            self.volatility_bonus,
            self.closed_eyes,
            self.head_deviation,
            self.degenerate_pose,
            self.motion,
        ]
        .into_iter()
        .fold(self.emotion_weight, u32::saturating_add)
    }

    /// Distraction level clamped to 0-100
    pub fn level(&self) -> u8 {
        self.unclamped().min(100) as u8
    }
}

/// Everything produced by one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub at: DateTime<Utc>,
    pub result: FocusResult,
    /// Present on face ticks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<DistractionBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<FocusAlert>,
}

impl TickOutcome {
    pub fn has_alert(&self) -> bool {
        self.alert.is_some()
    }
}

/// Dashboard status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusStatus {
    TrackingDisabled,
    NoFace,
    Distracted,
    Focused,
}

impl FocusStatus {
    /// Status for a result; `distracted_below` is the low-focus threshold
    pub fn classify(result: Option<&FocusResult>, tracking: bool, distracted_below: u8) -> Self {
        match result {
            _ if !tracking => FocusStatus::TrackingDisabled,
            None => FocusStatus::NoFace,
            Some(r) if !r.face_detected => FocusStatus::NoFace,
            Some(r) if r.focus_score < distracted_below => FocusStatus::Distracted,
            Some(_) => FocusStatus::Focused,
        }
    }
}

impl fmt::Display for FocusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FocusStatus::TrackingDisabled => "Tracking disabled",
            FocusStatus::NoFace => "No face detected",
            FocusStatus::Distracted => "Distracted",
            FocusStatus::Focused => "Well focused",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u8, face: bool) -> FocusResult {
        FocusResult {
            focus_score: score,
            distraction_level: 100 - score,
            dominant_emotion: EmotionLabel::Neutral,
            face_detected: face,
            attention_shift_count: 0,
        }
    }

    #[test]
    fn test_breakdown_clamps() {
        let breakdown = DistractionBreakdown {
            emotion_weight: 80,
            volatility_bonus: 15,
            closed_eyes: 50,
            ..Default::default()
        };
        assert_eq!(breakdown.unclamped(), 145);
        assert_eq!(breakdown.level(), 100);
    }

    #[test]
    fn test_breakdown_sum_saturates() {
        let breakdown = DistractionBreakdown {
            emotion_weight: 80,
            degenerate_pose: u32::MAX,
            motion: u32::MAX,
            ..Default::default()
        };
        assert_eq!(breakdown.unclamped(), u32::MAX);
        assert_eq!(breakdown.level(), 100);
    }

    #[test]
    fn test_status() {
        assert_eq!(FocusStatus::classify(Some(&result(90, true)), false, 40), FocusStatus::TrackingDisabled);
        assert_eq!(FocusStatus::classify(None, true, 40), FocusStatus::NoFace);
        assert_eq!(FocusStatus::classify(Some(&result(90, false)), true, 40), FocusStatus::NoFace);
        assert_eq!(FocusStatus::classify(Some(&result(39, true)), true, 40), FocusStatus::Distracted);
        assert_eq!(FocusStatus::classify(Some(&result(40, true)), true, 40), FocusStatus::Focused);
        assert_eq!(FocusStatus::Focused.to_string(), "Well focused");
    }
}
