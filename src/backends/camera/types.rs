// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Result type of camera backend operations
pub type BackendResult<T> = Result<T, CameraError>;

/// Which way the requested camera should face
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointing away from the user
    #[default]
    Environment,
    /// Front camera, pointing at the user
    User,
}

impl FacingMode {
    /// Check whether a device location string ("back", "front", ...) matches
    pub fn matches_location(&self, location: &str) -> bool {
        let location = location.trim().to_ascii_lowercase();
        match self {
            FacingMode::Environment => matches!(location.as_str(), "back" | "rear" | "environment"),
            FacingMode::User => matches!(location.as_str(), "front" | "user"),
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,                    // Device node or source file
    pub driver: Option<String>,          // V4L2 driver name
    pub camera_location: Option<String>, // "front", "back", or "external"
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<u32>,
    pub pixel_format: String, // FourCC code (e.g., "MJPG", "YUYV")
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = self.framerate {
            write!(f, "{}x{} {} @ {}fps", self.width, self.height, self.pixel_format, fps)
        } else {
            write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
        }
    }
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    YUYV,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    UYVY,
}

impl PixelFormat {
    /// Bytes per pixel in the packed layout
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGBA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
            Self::YUYV | Self::UYVY => 2,
        }
    }
}

/// A single frame from a camera stream
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel bytes in `format` layout
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride (bytes per row, may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed frame
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * format.bytes_per_pixel(),
            data: Arc::from(data.into_boxed_slice()),
            format,
            captured_at: Instant::now(),
        }
    }

    /// Check that the buffer is large enough for the declared geometry
    pub fn is_complete(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() >= (self.stride as usize) * (self.height as usize)
    }
}

/// What a caller asks for when opening a stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenRequest {
    /// Facing hint used when no device is pinned
    pub facing: FacingMode,
    /// Explicit device path, wins over `facing`
    pub device_path: Option<String>,
}

impl OpenRequest {
    pub fn facing(facing: FacingMode) -> Self {
        Self {
            facing,
            device_path: None,
        }
    }
}

/// Pick the device to open for a request
///
/// A pinned path must exist. Otherwise the first device whose location
/// matches the facing hint wins, then the first device at all.
pub fn select_device<'a>(
    devices: &'a [CameraDevice],
    request: &OpenRequest,
) -> BackendResult<&'a CameraDevice> {
    if let Some(path) = &request.device_path {
        return devices
            .iter()
            .find(|d| &d.path == path)
            .ok_or(CameraError::NoCameraFound);
    }

    devices
        .iter()
        .find(|d| {
            d.camera_location
                .as_deref()
                .is_some_and(|loc| request.facing.matches_location(loc))
        })
        .or_else(|| devices.first())
        .ok_or(CameraError::NoCameraFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(path: &str, location: Option<&str>) -> CameraDevice {
        CameraDevice {
            name: path.to_string(),
            path: path.to_string(),
            driver: None,
            camera_location: location.map(str::to_string),
        }
    }

    #[test]
    fn test_select_prefers_matching_facing() {
        let devices = vec![
            device("/dev/video0", Some("front")),
            device("/dev/video2", Some("back")),
        ];
        let picked = select_device(&devices, &OpenRequest::facing(FacingMode::Environment)).unwrap();
        assert_eq!(picked.path, "/dev/video2");

        let picked = select_device(&devices, &OpenRequest::facing(FacingMode::User)).unwrap();
        assert_eq!(picked.path, "/dev/video0");
    }

    #[test]
    fn test_select_falls_back_to_first() {
        let devices = vec![device("/dev/video0", None), device("/dev/video1", None)];
        let picked = select_device(&devices, &OpenRequest::default()).unwrap();
        assert_eq!(picked.path, "/dev/video0");
    }

    #[test]
    fn test_select_pinned_path_must_exist() {
        let devices = vec![device("/dev/video0", None)];
        let request = OpenRequest {
            facing: FacingMode::Environment,
            device_path: Some("/dev/video9".to_string()),
        };
        assert_eq!(
            select_device(&devices, &request),
            Err(CameraError::NoCameraFound)
        );
        assert_eq!(
            select_device(&[], &OpenRequest::default()),
            Err(CameraError::NoCameraFound)
        );
    }

    #[test]
    fn test_packed_frame_stride() {
        let frame = CameraFrame::packed(4, 2, PixelFormat::YUYV, vec![0; 16]);
        assert_eq!(frame.stride, 8);
        assert!(frame.is_complete());
    }
}
