//! Frame source abstraction (camera + face detector)

use focus_engine::FrameObservation;
use std::future::Future;
use thiserror::Error;

/// Detector error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("Detector unavailable: {0}")]
    Unavailable(String),

    #[error("Detection failed: {0}")]
    Failed(String),

    #[error("Unknown capture device: {0}")]
    UnknownDevice(String),
}

/// Supplies one observation per detection call.
///
/// Detection runs on a spawned task, so implementations must be shareable.
pub trait FrameSource: Send + Sync + 'static {
    /// Capture a frame and run face detection on it
    fn detect(&self) -> impl Future<Output = Result<FrameObservation, DetectError>> + Send;

    /// Ask for camera access; `false` means denied
    fn request_permission(&self) -> impl Future<Output = bool> + Send;

    /// Point the source at another capture device
    fn select_device(&self, device_id: &str) -> Result<(), DetectError> {
        let _ = device_id;
        Ok(())
    }
}
