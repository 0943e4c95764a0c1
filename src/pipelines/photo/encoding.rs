// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Captured frames leave the device as JPEG, the format the analysis
//! endpoint expects for `capture.jpg`.

use crate::constants::EncodingQuality;
use crate::errors::PhotoError;
use image::RgbImage;
use tracing::debug;

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new(EncodingQuality::High)
    }
}

impl PhotoEncoder {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }

    /// Encode image as JPEG
    pub fn encode_jpeg(&self, image: &RgbImage) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut cursor,
            self.quality.jpeg_quality(),
        );

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

        debug!(
            size = buffer.len(),
            quality = self.quality.jpeg_quality(),
            "Encoded JPEG"
        );
        Ok(buffer)
    }
}
