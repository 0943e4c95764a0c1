// SPDX-License-Identifier: GPL-3.0-only

//! Still image virtual camera
//!
//! Serves an image file as if it were a live camera. Useful on machines
//! without a camera and for exercising the camera flow end to end.

use super::types::*;
use super::{CameraBackend, CameraStream, StreamHandle};
use crate::errors::CameraError;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

enum Source {
    File(PathBuf),
    Image(Arc<RgbaImage>),
}

/// Backend that turns a still image into a camera stream
pub struct StillImageBackend {
    source: Source,
    /// Streams opened and not yet stopped
    active_streams: Arc<AtomicUsize>,
}

impl StillImageBackend {
    /// Serve an image file
    pub fn new(path: PathBuf) -> Self {
        Self {
            source: Source::File(path),
            active_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve an in-memory image
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            source: Source::Image(Arc::new(image)),
            active_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of streams currently holding the "device"
    pub fn active_streams(&self) -> usize {
        self.active_streams.load(Ordering::SeqCst)
    }

    fn device(&self) -> CameraDevice {
        let path = match &self.source {
            Source::File(path) => path.display().to_string(),
            Source::Image(_) => "memory".to_string(),
        };
        CameraDevice {
            name: "Still image".to_string(),
            path,
            driver: None,
            camera_location: Some("back".to_string()),
        }
    }

    fn load(&self) -> BackendResult<CameraFrame> {
        let rgba = match &self.source {
            Source::Image(image) => image.as_ref().clone(),
            Source::File(path) => {
                info!(path = %path.display(), "Loading still image source");
                image::open(path)
                    .map_err(|e| match e {
                        image::ImageError::IoError(io) => CameraError::from_io(&io),
                        other => CameraError::InvalidFormat(format!(
                            "Failed to load image '{}': {}",
                            path.display(),
                            other
                        )),
                    })?
                    .to_rgba8()
            }
        };

        let (width, height) = rgba.dimensions();
        Ok(CameraFrame::packed(
            width,
            height,
            PixelFormat::RGBA,
            rgba.into_raw(),
        ))
    }
}

impl CameraBackend for StillImageBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![self.device()]
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        match self.load() {
            Ok(frame) => vec![CameraFormat {
                width: frame.width,
                height: frame.height,
                framerate: None,
                pixel_format: "RGBA".to_string(),
            }],
            Err(_) => Vec::new(),
        }
    }

    fn open(&self, request: &OpenRequest) -> BackendResult<StreamHandle> {
        let device = self.device();
        if let Some(path) = &request.device_path
            && path != &device.path
        {
            return Err(CameraError::NoCameraFound);
        }

        let frame = self.load()?;
        self.active_streams.fetch_add(1, Ordering::SeqCst);

        Ok(StreamHandle::new(Box::new(StillImageStream {
            device,
            frame: Some(frame),
            active_streams: Arc::clone(&self.active_streams),
        })))
    }

    fn name(&self) -> &'static str {
        "still-image"
    }
}

struct StillImageStream {
    device: CameraDevice,
    frame: Option<CameraFrame>,
    active_streams: Arc<AtomicUsize>,
}

impl CameraStream for StillImageStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.frame.clone().map(|mut frame| {
            frame.captured_at = std::time::Instant::now();
            frame
        })
    }

    fn stop(&mut self) {
        if self.frame.take().is_some() {
            self.active_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
