// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │     Controller      │  holds at most one StreamHandle
//! └──────────┬──────────┘
//!            │ open(request)
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌───────────┐
//!   │ V4L2 │  │Still image│
//!   └──────┘  └───────────┘
//! ```

pub mod still_image;
pub mod types;
pub mod v4l2;

pub use still_image::StillImageBackend;
pub use types::*;
pub use v4l2::V4l2Backend;

use crate::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Camera backend trait
///
/// A backend knows how to find devices and open a live stream on one of them.
/// Opening is blocking and should be run off the UI loop.
pub trait CameraBackend: Send + Sync {
    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Supported formats for a device
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat>;

    /// Open a live stream
    ///
    /// Permission failures must surface as `CameraError::PermissionDenied`
    /// so callers can show the permission-specific message.
    fn open(&self, request: &OpenRequest) -> BackendResult<StreamHandle>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// A running camera stream
pub trait CameraStream: Send {
    /// The device this stream reads from
    fn device(&self) -> &CameraDevice;

    /// Most recent frame, if one has arrived
    fn latest_frame(&self) -> Option<CameraFrame>;

    /// Stop capturing and release the device. Must be idempotent.
    fn stop(&mut self);
}

/// Owned handle to an open stream
///
/// The device is released exactly once: by `release()` or, failing that, on drop.
pub struct StreamHandle {
    stream: Option<Box<dyn CameraStream>>,
}

impl StreamHandle {
    pub fn new(stream: Box<dyn CameraStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    pub fn device(&self) -> Option<&CameraDevice> {
        self.stream.as_ref().map(|s| s.device())
    }

    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.stream.as_ref().and_then(|s| s.latest_frame())
    }

    /// Stop all capture on the device. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            info!(device = %stream.device().path, "Releasing camera stream");
            stream.stop();
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.device() {
            Some(device) => write!(f, "StreamHandle({})", device.path),
            None => write!(f, "StreamHandle(released)"),
        }
    }
}

/// Build the backend for this run
///
/// A still-image source replaces the hardware backend entirely.
pub fn get_backend(config: &Config, still_source: Option<PathBuf>) -> Arc<dyn CameraBackend> {
    match still_source {
        Some(path) => {
            debug!(path = %path.display(), "Using still image as camera source");
            Arc::new(StillImageBackend::new(path))
        }
        None => Arc::new(V4l2Backend::new(config.camera_locations.clone())),
    }
}

/// Build the open request from config
pub fn open_request(config: &Config) -> OpenRequest {
    OpenRequest {
        facing: config.facing,
        device_path: config.camera_device.clone(),
    }
}
