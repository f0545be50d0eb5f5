//! Focus engine configuration

use crate::FocusError;
use alerting::{AlertConfig, MAX_COOLDOWN_SECONDS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Environment variable prefix for overrides, e.g. `FOCUS__EAR_THRESHOLD=0.2`
pub const ENV_PREFIX: &str = "FOCUS";

/// Focus engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mean eye aspect ratio below which eyes count as closed
    pub ear_threshold: f32,
    /// Distraction added for closed eyes
    pub closed_eyes_penalty: u32,

    /// Nose deviation (fraction of face width) that counts as a turned head
    pub head_deviation_ratio: f32,
    /// Distraction added for a turned head
    pub head_deviation_penalty: u32,

    /// Nose-to-eye-centre distance (pixels) below which the pose is unreliable
    pub degenerate_offset_px: f32,
    /// Distraction added for an unreliable pose
    pub degenerate_penalty: u32,

    /// Nose displacement (fraction of frame width) that counts as a motion burst
    pub motion_ratio: f32,
    /// Distraction added for a motion burst
    pub motion_penalty: u32,

    /// Consecutive missed detections before the face counts as lost
    pub missed_frame_threshold: u32,
    /// Focus points removed per tick once the face is lost
    pub missed_frame_decay: u8,

    /// Emotion history capacity
    pub history_capacity: usize,
    /// Recent history entries inspected for volatility
    pub volatility_window: usize,
    /// Distinct labels in the window that count as volatile
    pub volatility_min_distinct: usize,
    /// Distraction added for volatile emotions
    pub volatility_bonus: u32,

    /// Logistic steepness of the focus transform
    pub sigmoid_steepness: f64,
    /// Logistic midpoint of the focus transform
    pub sigmoid_midpoint: f64,

    /// Focus score at the start of a session
    pub initial_focus_score: u8,

    /// Low-focus alert settings
    pub alerts: AlertConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            closed_eyes_penalty: 50,
            head_deviation_ratio: 0.10,
            head_deviation_penalty: 25,
            degenerate_offset_px: 20.0,
            degenerate_penalty: 60,
            motion_ratio: 0.03,
            motion_penalty: 15,
            missed_frame_threshold: 10,
            missed_frame_decay: 10,
            history_capacity: 10,
            volatility_window: 5,
            volatility_min_distinct: 4,
            volatility_bonus: 15,
            sigmoid_steepness: 0.1,
            sigmoid_midpoint: 50.0,
            initial_focus_score: 100,
            alerts: AlertConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration: defaults, then an optional file, then `FOCUS__*` env vars
    pub fn load(path: Option<&Path>) -> Result<Self, FocusError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            info!("Loading engine configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }
        let loaded: EngineConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), FocusError> {
        if self.history_capacity == 0 {
            return Err(FocusError::Config("history_capacity must be at least 1".into()));
        }
        if self.volatility_window > self.history_capacity {
            return Err(FocusError::Config(format!(
                "volatility_window {} exceeds history_capacity {}",
                self.volatility_window, self.history_capacity
            )));
        }
        if self.missed_frame_threshold == 0 {
            return Err(FocusError::Config("missed_frame_threshold must be at least 1".into()));
        }
        let ratios = [
            ("ear_threshold", self.ear_threshold),
            ("head_deviation_ratio", self.head_deviation_ratio),
            ("degenerate_offset_px", self.degenerate_offset_px),
            ("motion_ratio", self.motion_ratio),
        ];
        if let Some((name, value)) = ratios.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(FocusError::Config(format!("{name} must be a non-negative number, got {value}")));
        }
        if !self.sigmoid_steepness.is_finite() || self.sigmoid_steepness <= 0.0 {
            return Err(FocusError::Config("sigmoid_steepness must be positive".into()));
        }
        let penalties = [
            ("closed_eyes_penalty", self.closed_eyes_penalty),
            ("head_deviation_penalty", self.head_deviation_penalty),
            ("degenerate_penalty", self.degenerate_penalty),
            ("motion_penalty", self.motion_penalty),
            ("volatility_bonus", self.volatility_bonus),
        ];
        if let Some((name, value)) = penalties.iter().find(|(_, v)| *v > 100) {
            return Err(FocusError::Config(format!("{name} must be within 0..=100, got {value}")));
        }
        if self.alerts.cooldown_seconds > MAX_COOLDOWN_SECONDS {
            return Err(FocusError::Config(format!(
                "alerts.cooldown_seconds must be at most {}, got {}",
                MAX_COOLDOWN_SECONDS, self.alerts.cooldown_seconds
            )));
        }
        if self.initial_focus_score > 100 || self.alerts.low_focus_threshold > 100 {
            return Err(FocusError::Config("scores are bounded to 0..=100".into()));
        }
        Ok(())
    }
}
