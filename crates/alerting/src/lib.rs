//! Alerting System
//!
//! Decides when a low focus score turns into a user-facing notification:
//! gating on timer mode and face presence, a wall-clock cooldown, and
//! pseudo-random suggestion selection.

mod manager;

pub use manager::{
    AlertConfig, AlertGate, AlertThrottle, FocusAlert, ThrottleState, TimerContext, TimerMode,
    DEFAULT_SUGGESTIONS, MAX_COOLDOWN_SECONDS,
};
