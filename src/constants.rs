// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Encoding quality settings for captured stills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get all variants for iteration
    pub const ALL: [EncodingQuality; 4] = [
        EncodingQuality::Low,
        EncodingQuality::Medium,
        EncodingQuality::High,
        EncodingQuality::Maximum,
    ];

    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EncodingQuality::Low => "Low",
            EncodingQuality::Medium => "Medium",
            EncodingQuality::High => "High",
            EncodingQuality::Maximum => "Maximum",
        }
    }
}

/// Wire contract of the analysis endpoint
pub mod wire {
    /// Multipart field carrying the image
    pub const FILE_FIELD: &str = "file";

    /// Filename sent with every submission, regardless of source
    pub const UPLOAD_FILENAME: &str = "capture.jpg";

    /// MIME type of camera captures
    pub const JPEG_MIME: &str = "image/jpeg";

    /// Header carrying the per-request id
    pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

    /// Largest response body accepted from the server
    pub const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

    /// Default endpoint (local analysis server)
    pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/analyze";
}

/// Camera timing constants
pub mod camera_timing {
    use super::Duration;

    /// Time to let auto-exposure settle before a headless capture
    pub const WARMUP: Duration = Duration::from_millis(500);

    /// Give up waiting for a first frame after this long
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Frame poll interval while waiting
    pub const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Number of mmap buffers requested from V4L2
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Longest wait for one V4L2 buffer before the capture loop re-checks
    /// whether it should stop
    pub const V4L2_DEQUEUE_TIMEOUT: Duration = Duration::from_millis(500);
}

/// File format constants
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
