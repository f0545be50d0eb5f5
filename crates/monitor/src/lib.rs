//! Focus Monitor
//!
//! Drives the focus engine from a frame source: session lifecycle
//! (permission, pause, device switch) and a tick loop that keeps at most one
//! detection in flight and drops results from a previous session.

mod lifecycle;
mod monitor;
mod source;

pub use lifecycle::{Lifecycle, LifecycleError, MonitorState, Transition};
pub use monitor::{FocusMonitor, MonitorCommand, MonitorConfig, MonitorError, MonitorEvent};
pub use source::{DetectError, FrameSource};
