//! Session state tracking

use crate::emotion::{EmotionHistoryEntry, EmotionLabel};
use alerting::ThrottleState;
use chrono::{DateTime, Utc};
use feature_engine::Point;
use ring_buffer::HistoryBuffer;
use serde::{Deserialize, Serialize};

/// Monitoring session state (tracked over ticks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Nose tip on the last face tick
    pub previous_nose_position: Option<Point>,

    /// Recent dominant emotions, oldest first
    pub emotion_history: HistoryBuffer<EmotionHistoryEntry>,

    /// Closed-eye, head-turn, and motion events this session
    pub(crate) attention_shift_count: u32,

    /// Detections in a row without a face
    pub consecutive_missed_frames: u32,

    /// Alert cooldown
    pub(crate) throttle: ThrottleState,

    /// Current focus score (0-100)
    pub(crate) focus_score: u8,

    /// Distraction level from the last face tick (0-100)
    pub distraction_level: u8,

    /// Dominant emotion from the last face tick
    pub dominant_emotion: EmotionLabel,

    /// Whether a face is considered present
    pub face_detected: bool,

    initial_focus_score: u8,
}

impl SessionState {
    pub fn new(history_capacity: usize, initial_focus_score: u8) -> Self {
        Self {
            previous_nose_position: None,
            emotion_history: HistoryBuffer::new(history_capacity),
            attention_shift_count: 0,
            consecutive_missed_frames: 0,
            throttle: ThrottleState::Idle,
            focus_score: initial_focus_score.min(100),
            distraction_level: 0,
            dominant_emotion: EmotionLabel::Neutral,
            face_detected: false,
            initial_focus_score: initial_focus_score.min(100),
        }
    }

    pub fn focus_score(&self) -> u8 {
        self.focus_score
    }

    pub fn attention_shift_count(&self) -> u32 {
        self.attention_shift_count
    }

    pub fn throttle(&self) -> &ThrottleState {
        &self.throttle
    }

    /// When the last alert fired, if the session has alerted
    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.throttle.last_alert_at()
    }

    pub(crate) fn record_attention_shift(&mut self) {
        self.attention_shift_count += 1;
    }

    /// Reset state (session stop, device switch, permission loss)
    pub fn reset(&mut self) {
        *self = Self::new(self.emotion_history.capacity(), self.initial_focus_score);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(ring_buffer::DEFAULT_CAPACITY, 100)
    }
}
