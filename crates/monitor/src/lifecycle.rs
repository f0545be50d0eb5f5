//! Session lifecycle state machine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Monitoring state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MonitorState {
    #[default]
    Stopped,
    RequestingPermission,
    Tracking,
    Paused,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MonitorState::Stopped => "stopped",
            MonitorState::RequestingPermission => "requesting-permission",
            MonitorState::Tracking => "tracking",
            MonitorState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Lifecycle error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: MonitorState,
        action: &'static str,
    },

    #[error("Camera permission not granted")]
    PermissionMissing,
}

/// Result of a successful transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: MonitorState,
    pub to: MonitorState,
    /// Session state must be reset
    pub reset: bool,
}

/// Lifecycle of one monitor.
///
/// `generation` changes whenever tracking stops or pauses; detection results
/// tagged with an older generation must be dropped.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: MonitorState,
    has_permission: Option<bool>,
    generation: u64,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// `None` until permission has been asked for
    pub fn has_permission(&self) -> Option<bool> {
        self.has_permission
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_tracking(&self) -> bool {
        self.state == MonitorState::Tracking
    }

    /// Begin tracking; asks for permission unless it was already granted
    pub fn start(&mut self) -> Result<Transition, LifecycleError> {
        match self.state {
            MonitorState::Stopped if self.has_permission == Some(true) => {
                Ok(self.move_to(MonitorState::Tracking, false))
            }
            MonitorState::Stopped => Ok(self.move_to(MonitorState::RequestingPermission, false)),
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "start",
            }),
        }
    }

    /// Record the permission answer
    pub fn permission_answered(&mut self, granted: bool) -> Result<Transition, LifecycleError> {
        if self.state != MonitorState::RequestingPermission {
            return Err(LifecycleError::InvalidTransition {
                state: self.state,
                action: "answer permission",
            });
        }
        self.has_permission = Some(granted);
        if granted {
            Ok(self.move_to(MonitorState::Tracking, false))
        } else {
            Ok(self.move_to(MonitorState::Stopped, false))
        }
    }

    pub fn pause(&mut self) -> Result<Transition, LifecycleError> {
        match self.state {
            MonitorState::Tracking => Ok(self.move_to(MonitorState::Paused, false)),
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "pause",
            }),
        }
    }

    pub fn resume(&mut self) -> Result<Transition, LifecycleError> {
        match self.state {
            MonitorState::Paused => Ok(self.move_to(MonitorState::Tracking, false)),
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "resume",
            }),
        }
    }

    /// Stop tracking; a no-op when already stopped
    pub fn stop(&mut self) -> Transition {
        match self.state {
            MonitorState::Stopped => Transition {
                from: MonitorState::Stopped,
                to: MonitorState::Stopped,
                reset: false,
            },
            MonitorState::RequestingPermission => self.move_to(MonitorState::Stopped, false),
            MonitorState::Tracking | MonitorState::Paused => self.move_to(MonitorState::Stopped, true),
        }
    }

    /// Camera access withdrawn by the platform
    pub fn revoke_permission(&mut self) -> Transition {
        self.has_permission = Some(false);
        let was_running = matches!(self.state, MonitorState::Tracking | MonitorState::Paused);
        self.move_to(MonitorState::Stopped, was_running)
    }

    /// First half of a device switch: tracking stops and the session resets
    pub fn begin_device_switch(&mut self) -> Result<Transition, LifecycleError> {
        match self.state {
            MonitorState::Tracking => Ok(self.move_to(MonitorState::Stopped, true)),
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "switch device",
            }),
        }
    }

    /// Second half of a device switch, after the settling delay
    pub fn finish_device_switch(&mut self) -> Result<Transition, LifecycleError> {
        if self.has_permission != Some(true) {
            return Err(LifecycleError::PermissionMissing);
        }
        match self.state {
            MonitorState::Stopped => Ok(self.move_to(MonitorState::Tracking, false)),
            state => Err(LifecycleError::InvalidTransition {
                state,
                action: "resume after device switch",
            }),
        }
    }

    fn move_to(&mut self, to: MonitorState, reset: bool) -> Transition {
        let from = self.state;
        if from == MonitorState::Tracking && to != MonitorState::Tracking {
            self.generation += 1;
        }
        self.state = to;
        debug!(%from, %to, reset, generation = self.generation, "Lifecycle transition");
        Transition { from, to, reset }
    }
}
