// SPDX-License-Identifier: MPL-2.0

//! Loading user-picked image files

use crate::constants::{file_formats, wire};
use crate::pipelines::photo::{ImageSource, SelectedImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Read an image file and decode it for preview
///
/// The file's bytes are submitted unchanged; the MIME type is taken from the
/// detected format.
pub async fn load_image_file(path: PathBuf) -> Result<SelectedImage, String> {
    info!(path = %path.display(), "Loading image file");

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("Could not read '{}': {}", path.display(), e))?;

    if bytes.is_empty() {
        return Err(format!("'{}' is empty", path.display()));
    }

    let bytes: Arc<[u8]> = Arc::from(bytes.into_boxed_slice());
    let bytes_clone = Arc::clone(&bytes);

    // Decode in blocking task
    let (mime, preview) = tokio::task::spawn_blocking(move || {
        let format = image::guess_format(&bytes_clone)
            .map_err(|_| "Unsupported image format".to_string())?;
        let img = image::load_from_memory_with_format(&bytes_clone, format)
            .map_err(|e| format!("Could not decode image: {}", e))?;
        Ok::<_, String>((format.to_mime_type().to_string(), img.to_rgba8()))
    })
    .await
    .map_err(|e| format!("Decode task error: {}", e))??;

    let (width, height) = preview.dimensions();
    debug!(width, height, mime = %mime, size = bytes.len(), "Image file decoded");

    Ok(SelectedImage {
        bytes,
        mime: mime_or_jpeg(&mime),
        width,
        height,
        source: ImageSource::Upload { path },
        preview: Arc::new(preview),
    })
}

/// Does the path look like an image we can preview?
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| file_formats::is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

fn mime_or_jpeg(mime: &str) -> String {
    if mime.starts_with("image/") {
        mime.to_string()
    } else {
        wire::JPEG_MIME.to_string()
    }
}
