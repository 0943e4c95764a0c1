// SPDX-License-Identifier: MPL-2.0

//! Still image pipeline
//!
//! ```text
//! Camera frame ──► processing (RGB, native size) ──► encoding (JPEG) ──┐
//!                                                                      ├──► SelectedImage
//! Local file  ──► storage::load_image_file (bytes + decoded preview) ──┘
//! ```

pub mod capture;
pub mod encoding;
pub mod processing;

pub use capture::PhotoCapture;
pub use encoding::PhotoEncoder;

use crate::constants::wire;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the selected image came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Still captured from a camera device
    Camera { device: String },
    /// File picked by the user
    Upload { path: PathBuf },
}

/// The one image pending submission
#[derive(Clone)]
pub struct SelectedImage {
    /// Encoded bytes sent as the `file` part
    pub bytes: Arc<[u8]>,
    /// MIME type of `bytes`
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub source: ImageSource,
    /// Decoded pixels for the preview region
    pub preview: Arc<RgbaImage>,
}

impl SelectedImage {
    /// Filename sent with the multipart part
    pub fn filename(&self) -> &'static str {
        wire::UPLOAD_FILENAME
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for SelectedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedImage")
            .field("bytes", &self.bytes.len())
            .field("mime", &self.mime)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("source", &self.source)
            .finish()
    }
}
