//! Focus Engine
//!
//! Real-time attention scoring from per-frame face observations:
//! - Dominant emotion and emotional volatility
//! - Eye closure (eye aspect ratio)
//! - Head deviation and unreliable profile poses
//! - Head motion bursts
//! - Logistic focus score and throttled low-focus alerts

pub mod aggregator;
pub mod analysis;
pub mod config;
pub mod emotion;
pub mod observation;
pub mod state;
pub mod summary;

pub use aggregator::{focus_from_distraction, DistractionAggregator};
pub use alerting::{AlertConfig, FocusAlert, TimerContext, TimerMode};
pub use analysis::{DistractionBreakdown, FocusResult, FocusStatus, TickOutcome};
pub use config::EngineConfig;
pub use emotion::{EmotionClassifier, EmotionHistoryEntry, EmotionLabel, EmotionReading, ExpressionScores};
pub use feature_engine::Point;
pub use observation::{BoundingBox, FaceObservation, FrameObservation};
pub use state::SessionState;
pub use summary::{SessionSummary, SummaryAccumulator};

use alerting::{AlertGate, AlertThrottle};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

/// Focus engine error types
#[derive(Error, Debug)]
pub enum FocusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] ::config::ConfigError),
}

/// Attention scoring engine for one monitoring session at a time
pub struct FocusEngine {
    config: EngineConfig,
    classifier: EmotionClassifier,
    aggregator: DistractionAggregator,
    throttle: AlertThrottle,
    state: SessionState,
    summary: SummaryAccumulator,
}

impl FocusEngine {
    /// Create a new engine with configuration
    pub fn new(config: EngineConfig) -> Result<Self, FocusError> {
        let throttle = AlertThrottle::new(config.alerts.clone());
        Self::build(config, throttle)
    }

    /// Create an engine whose suggestion choice is reproducible
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self, FocusError> {
        let throttle = AlertThrottle::with_seed(config.alerts.clone(), seed);
        Self::build(config, throttle)
    }

    fn build(config: EngineConfig, throttle: AlertThrottle) -> Result<Self, FocusError> {
        config.validate()?;
        Ok(Self {
            classifier: EmotionClassifier::new(
                config.volatility_window,
                config.volatility_min_distinct,
                config.volatility_bonus,
            ),
            aggregator: DistractionAggregator::new(config.clone()),
            throttle,
            state: SessionState::new(config.history_capacity, config.initial_focus_score),
            summary: SummaryAccumulator::new(),
            config,
        })
    }

    /// Process one tick's observation
    pub fn process(
        &mut self,
        observation: &FrameObservation,
        context: TimerContext,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        let breakdown = match observation {
            FrameObservation::Face(face) => {
                let reading =
                    self.classifier
                        .classify(&face.expressions, &mut self.state.emotion_history, now);
                Some(self.aggregator.apply_face(&mut self.state, face, reading))
            }
            FrameObservation::NoFace => {
                self.aggregator.apply_missed(&mut self.state);
                None
            }
        };

        let result = self.result();
        let gate = AlertGate {
            face_detected: result.face_detected,
            focus_score: result.focus_score,
            context,
        };
        let alert = self.throttle.evaluate(&mut self.state.throttle, &gate, now);

        let outcome = TickOutcome {
            at: now,
            result,
            breakdown,
            alert,
        };
        self.summary.record(&outcome, observation.is_face());
        outcome
    }

    /// Current focus reading
    pub fn result(&self) -> FocusResult {
        FocusResult {
            focus_score: self.state.focus_score(),
            distraction_level: self.state.distraction_level,
            dominant_emotion: self.state.dominant_emotion,
            face_detected: self.state.face_detected,
            attention_shift_count: self.state.attention_shift_count(),
        }
    }

    /// Dashboard status for the current reading
    pub fn status(&self, tracking: bool) -> FocusStatus {
        FocusStatus::classify(
            Some(&self.result()),
            tracking,
            self.config.alerts.low_focus_threshold,
        )
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summary of the session so far
    pub fn summary(&self, now: DateTime<Utc>) -> SessionSummary {
        self.summary
            .summarize(self.state.attention_shift_count(), now)
    }

    /// End the current session and start a fresh one
    pub fn reset(&mut self, now: DateTime<Utc>) -> SessionSummary {
        let summary = self.summary(now);
        info!(
            session = %summary.session_id,
            ticks = summary.ticks,
            shifts = summary.attention_shift_count,
            "Focus session reset"
        );
        self.state.reset();
        self.summary = SummaryAccumulator::new();
        summary
    }
}
