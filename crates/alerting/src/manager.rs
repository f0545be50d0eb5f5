//! Alert Throttle Implementation

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Suggestions shown alongside a low-focus alert
pub const DEFAULT_SUGGESTIONS: [&str; 7] = [
    "Take a deep breath and reset your attention",
    "Look away from screen for 20 seconds, then refocus",
    "Consider a short 2-minute stretching break",
    "Your attention is wandering. Gently bring it back to your task",
    "Try the Pomodoro technique - work for 25 minutes, then take a break",
    "Minimize distractions in your environment",
    "Write down any distracting thoughts to address later",
];

/// Longest cooldown accepted from configuration (one day)
pub const MAX_COOLDOWN_SECONDS: u64 = 86_400;

/// Alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Focus score below which an alert is considered (default: 40)
    pub low_focus_threshold: u8,
    /// Minimum wall-clock gap between alerts (seconds)
    pub cooldown_seconds: u64,
    /// Text prepended to the chosen suggestion
    pub message_prefix: String,
    /// Suggestion catalogue; an empty list falls back to the defaults
    pub suggestions: Vec<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            low_focus_threshold: 40,
            cooldown_seconds: 30,
            message_prefix: "Low focus detected: ".to_string(),
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Pomodoro mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

/// Pomodoro timer as seen by the focus engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerContext {
    /// Timer is running
    pub is_active: bool,
    /// Current timer mode
    pub mode: TimerMode,
}

impl TimerContext {
    /// Running work interval
    pub fn working() -> Self {
        Self {
            is_active: true,
            mode: TimerMode::Work,
        }
    }

    /// Alerts are only meaningful during an active work interval
    pub fn allows_alerts(&self) -> bool {
        self.is_active && self.mode == TimerMode::Work
    }
}

/// Everything the throttle needs to know about the current tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertGate {
    pub face_detected: bool,
    pub focus_score: u8,
    pub context: TimerContext,
}

/// Throttle state, owned by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThrottleState {
    #[default]
    Idle,
    Cooldown {
        /// When the last alert was emitted
        fired_at: DateTime<Utc>,
        /// No further alerts before this instant
        expires_at: DateTime<Utc>,
    },
}

impl ThrottleState {
    /// A cooldown is live at `now`
    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        match self {
            ThrottleState::Idle => false,
            ThrottleState::Cooldown { expires_at, .. } => now < *expires_at,
        }
    }

    /// Timestamp of the last emitted alert, if any
    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ThrottleState::Idle => None,
            ThrottleState::Cooldown { fired_at, .. } => Some(*fired_at),
        }
    }
}

/// Low-focus notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusAlert {
    /// Full user-facing message
    pub message: String,
    /// The suggestion embedded in the message
    pub suggestion: String,
    /// Score that triggered the alert
    pub focus_score: u8,
    pub emitted_at: DateTime<Utc>,
}

/// Alert throttle: at most one alert per cooldown window
pub struct AlertThrottle {
    config: AlertConfig,
    rng: StdRng,
}

impl AlertThrottle {
    /// Create a throttle seeded from OS entropy
    pub fn new(config: AlertConfig) -> Self {
        info!(
            threshold = config.low_focus_threshold,
            cooldown_s = config.cooldown_seconds,
            "Creating alert throttle"
        );
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a throttle with a fixed seed (reproducible suggestion order)
    pub fn with_seed(config: AlertConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Tick qualifies for an alert, ignoring the cooldown
    pub fn qualifies(&self, gate: &AlertGate) -> bool {
        gate.face_detected
            && gate.context.allows_alerts()
            && gate.focus_score < self.config.low_focus_threshold
    }

    /// Evaluate one tick, emitting an alert and entering cooldown when allowed
    pub fn evaluate(
        &mut self,
        state: &mut ThrottleState,
        gate: &AlertGate,
        now: DateTime<Utc>,
    ) -> Option<FocusAlert> {
        if !self.qualifies(gate) {
            return None;
        }

        if state.is_cooling_down(now) {
            debug!("Alert suppressed: in cooldown period");
            return None;
        }

        let suggestion = self.pick_suggestion();
        let expires_at = i64::try_from(self.config.cooldown_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|cooldown| now.checked_add_signed(cooldown))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        *state = ThrottleState::Cooldown {
            fired_at: now,
            expires_at,
        };

        info!(score = gate.focus_score, "Low focus alert: {}", suggestion);

        Some(FocusAlert {
            message: format!("{}{}", self.config.message_prefix, suggestion),
            suggestion,
            focus_score: gate.focus_score,
            emitted_at: now,
        })
    }

    fn pick_suggestion(&mut self) -> String {
        match self.config.suggestions.choose(&mut self.rng) {
            Some(s) => s.clone(),
            None => DEFAULT_SUGGESTIONS
                .choose(&mut self.rng)
                .map(|s| s.to_string())
                .unwrap_or_default(),
        }
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
