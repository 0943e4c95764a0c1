// SPDX-License-Identifier: MPL-2.0

//! Photo capture from a live stream
//!
//! Grabs the stream's latest frame and turns it into the selected image.
//! Releasing the stream is the caller's job.

use super::processing::frame_to_rgb;
use super::{ImageSource, PhotoEncoder, SelectedImage};
use crate::backends::camera::StreamHandle;
use crate::backends::camera::types::CameraFrame;
use crate::constants::wire;
use crate::errors::PhotoError;
use std::sync::Arc;
use tracing::{debug, info};

/// Photo capture handler
pub struct PhotoCapture;

impl PhotoCapture {
    /// Capture the current frame of a stream
    pub fn capture_from_stream(
        stream: &StreamHandle,
        encoder: &PhotoEncoder,
    ) -> Result<SelectedImage, PhotoError> {
        let frame = stream.latest_frame().ok_or(PhotoError::NoFrameAvailable)?;
        let device = stream
            .device()
            .map(|d| d.path.clone())
            .unwrap_or_default();
        Self::capture_from_frame(&frame, device, encoder)
    }

    /// Encode a frame at its native resolution
    pub fn capture_from_frame(
        frame: &CameraFrame,
        device: String,
        encoder: &PhotoEncoder,
    ) -> Result<SelectedImage, PhotoError> {
        info!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Capturing still"
        );

        let rgb = frame_to_rgb(frame)?;
        let bytes = encoder.encode_jpeg(&rgb)?;
        let preview = image::DynamicImage::ImageRgb8(rgb).to_rgba8();

        debug!(size = bytes.len(), "Still encoded");

        Ok(SelectedImage {
            bytes: Arc::from(bytes.into_boxed_slice()),
            mime: wire::JPEG_MIME.to_string(),
            width: frame.width,
            height: frame.height,
            source: ImageSource::Camera { device },
            preview: Arc::new(preview),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;

    #[test]
    fn test_capture_from_frame() {
        let frame = CameraFrame::packed(32, 24, PixelFormat::RGB24, vec![128u8; 32 * 24 * 3]);

        let captured =
            PhotoCapture::capture_from_frame(&frame, "/dev/video0".to_string(), &PhotoEncoder::default())
                .unwrap();
        assert_eq!(captured.width, 32);
        assert_eq!(captured.height, 24);
        assert_eq!(captured.mime, "image/jpeg");
        assert_eq!(captured.filename(), "capture.jpg");
        assert_eq!(captured.preview.dimensions(), (32, 24));
    }
}
