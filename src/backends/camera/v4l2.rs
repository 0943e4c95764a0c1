// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 camera capture
//!
//! Opens a `/dev/video*` node with the v4l crate, negotiates MJPG or a packed
//! YUV format, and keeps the most recent frame available to the controller.
//! Capture runs on its own thread; the device is closed when that thread exits.

use super::types::*;
use super::{CameraBackend, CameraStream, StreamHandle};
use crate::constants::camera_timing;
use crate::errors::CameraError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Formats we can turn into RGB, in order of preference
const PREFERRED_FOURCCS: [&[u8; 4]; 4] = [b"MJPG", b"YUYV", b"UYVY", b"RGB3"];

/// V4L2 camera backend
pub struct V4l2Backend {
    /// Known physical location per device path ("front", "back")
    locations: HashMap<String, String>,
}

impl V4l2Backend {
    pub fn new(locations: HashMap<String, String>) -> Self {
        Self { locations }
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut cameras = Vec::new();

        for node in v4l::context::enum_devices() {
            let path = node.path().to_string_lossy().to_string();

            let dev = match Device::with_path(&path) {
                Ok(d) => d,
                Err(e) => {
                    debug!(path = %path, error = %e, "Skipping unreadable video node");
                    continue;
                }
            };

            let Ok(caps) = dev.query_caps() else {
                continue;
            };

            // Metadata nodes share the driver but cannot capture frames
            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                continue;
            }

            cameras.push(CameraDevice {
                name: node.name().unwrap_or_else(|| caps.card.clone()),
                camera_location: self.locations.get(&path).cloned(),
                driver: Some(caps.driver.clone()),
                path,
            });
        }

        cameras.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = cameras.len(), "Enumerated V4L2 cameras");
        cameras
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        let dev = match Device::with_path(&device.path) {
            Ok(d) => d,
            Err(_) => return Vec::new(),
        };

        let mut formats = Vec::new();

        let Ok(descriptions) = dev.enum_formats() else {
            return formats;
        };

        for desc in descriptions {
            let Ok(sizes) = dev.enum_framesizes(desc.fourcc) else {
                continue;
            };
            for size in sizes {
                if let v4l::framesize::FrameSizeEnum::Discrete(discrete) = size.size {
                    let fps = dev
                        .enum_frameintervals(desc.fourcc, discrete.width, discrete.height)
                        .ok()
                        .and_then(|intervals| {
                            intervals.into_iter().find_map(|i| match i.interval {
                                v4l::frameinterval::FrameIntervalEnum::Discrete(frac)
                                    if frac.numerator > 0 =>
                                {
                                    Some(frac.denominator / frac.numerator)
                                }
                                _ => None,
                            })
                        });

                    formats.push(CameraFormat {
                        width: discrete.width,
                        height: discrete.height,
                        framerate: fps,
                        pixel_format: desc.fourcc.to_string(),
                    });
                }
            }
        }

        formats
    }

    fn open(&self, request: &OpenRequest) -> BackendResult<StreamHandle> {
        let cameras = self.enumerate_cameras();

        // A pinned device may be hidden from enumeration when we lack
        // permission to open it; try it directly so the error is classified.
        let device = match (&request.device_path, select_device(&cameras, request)) {
            (_, Ok(device)) => device.clone(),
            (Some(path), Err(_)) => CameraDevice {
                name: path.clone(),
                path: path.clone(),
                driver: None,
                camera_location: self.locations.get(path).cloned(),
            },
            (None, Err(_)) => return Err(probe_first_node().unwrap_or(CameraError::NoCameraFound)),
        };

        info!(device = %device.path, facing = %request.facing, "Opening V4L2 camera");
        let stream = V4l2Stream::start(device)?;
        Ok(StreamHandle::new(Box::new(stream)))
    }

    fn name(&self) -> &'static str {
        "v4l2"
    }
}

/// When enumeration finds nothing, find out why
///
/// Nodes that exist but cannot be opened usually mean missing permission
/// (user not in the `video` group).
fn probe_first_node() -> Option<CameraError> {
    let entries = std::fs::read_dir("/dev").ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with("video") {
            continue;
        }
        if let Err(e) = Device::with_path(entry.path()) {
            let classified = CameraError::from_io(&e);
            if classified.is_permission_denied() {
                return Some(classified);
            }
        }
    }
    None
}

/// Running V4L2 capture
pub struct V4l2Stream {
    device: CameraDevice,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl V4l2Stream {
    /// Start the capture thread and wait until the device is configured
    fn start(device: CameraDevice) -> BackendResult<Self> {
        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel::<BackendResult<Format>>();

        let path = device.path.clone();
        let latest_clone = Arc::clone(&latest);
        let running_clone = Arc::clone(&running);

        let thread_handle = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || capture_loop(&path, latest_clone, running_clone, ready_tx))
            .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        let format = ready_rx.recv().unwrap_or_else(|_| {
            Err(CameraError::InitializationFailed(
                "Capture thread exited during startup".to_string(),
            ))
        });

        match format {
            Ok(format) => {
                info!(
                    device = %device.path,
                    width = format.width,
                    height = format.height,
                    fourcc = %format.fourcc,
                    "V4L2 stream started"
                );
                Ok(Self {
                    device,
                    latest,
                    running,
                    thread_handle: Some(thread_handle),
                })
            }
            Err(e) => {
                let _ = thread_handle.join();
                Err(e)
            }
        }
    }
}

impl CameraStream for V4l2Stream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest.lock().ok().and_then(|slot| slot.clone())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            match handle.join() {
                Ok(_) => info!(device = %self.device.path, "Capture thread stopped"),
                Err(_) => warn!(device = %self.device.path, "Capture thread panicked"),
            }
        }

        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open and configure the device, pick the first format we can decode
fn configure(path: &str) -> BackendResult<(Device, Format)> {
    let dev = Device::with_path(path).map_err(|e| CameraError::from_io(&e))?;

    let current = dev.format().map_err(|e| CameraError::from_io(&e))?;

    for fourcc in PREFERRED_FOURCCS {
        let mut wanted = current.clone();
        wanted.fourcc = FourCC::new(fourcc);

        match dev.set_format(&wanted) {
            Ok(applied) if applied.fourcc == wanted.fourcc => return Ok((dev, applied)),
            Ok(applied) => {
                debug!(wanted = %wanted.fourcc, got = %applied.fourcc, "Format not accepted");
            }
            Err(e) => {
                let classified = CameraError::from_io(&e);
                if classified == CameraError::Busy || classified.is_permission_denied() {
                    return Err(classified);
                }
                debug!(fourcc = %wanted.fourcc, error = %e, "Could not set format");
            }
        }
    }

    Err(CameraError::InvalidFormat(format!(
        "{} offers no supported pixel format",
        path
    )))
}

/// Main capture loop running in a separate thread
fn capture_loop(
    path: &str,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    running: Arc<AtomicBool>,
    ready: mpsc::Sender<BackendResult<Format>>,
) {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    let (dev, format) = match configure(path) {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut stream = match MmapStream::with_buffers(
        &dev,
        Type::VideoCapture,
        camera_timing::V4L2_BUFFER_COUNT,
    ) {
        Ok(s) => s,
        Err(e) => {
            let _ = ready.send(Err(CameraError::from_io(&e)));
            return;
        }
    };

    // Bounded dequeue so a stalled device cannot keep stop() waiting
    stream.set_timeout(camera_timing::V4L2_DEQUEUE_TIMEOUT);

    let _ = ready.send(Ok(format.clone()));

    while running.load(Ordering::SeqCst) {
        match stream.next() {
            Ok((buf, _meta)) => {
                let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                match decode_buffer(buf, &format) {
                    Ok(frame) => {
                        if let Ok(mut slot) = latest.lock() {
                            *slot = Some(frame);
                        }
                    }
                    Err(e) => {
                        // Corrupt MJPG frames are common right after stream start
                        if frame_num % 30 == 0 {
                            warn!(frame = frame_num, error = %e, "Dropping undecodable frame");
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                debug!(device = path, "No frame within dequeue timeout");
            }
            Err(e) => {
                error!(device = path, error = %e, "V4L2 capture failed");
                break;
            }
        }
    }

    debug!(device = path, "Capture loop exiting");
}

/// Convert one driver buffer into a frame
pub(crate) fn decode_buffer(buf: &[u8], format: &Format) -> Result<CameraFrame, String> {
    let fourcc = &format.fourcc.repr;

    if fourcc == b"MJPG" {
        let img = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)
            .map_err(|e| format!("MJPG decode failed: {}", e))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        return Ok(CameraFrame::packed(
            width,
            height,
            PixelFormat::RGB24,
            img.into_raw(),
        ));
    }

    let pixel_format = match fourcc {
        b"YUYV" => PixelFormat::YUYV,
        b"UYVY" => PixelFormat::UYVY,
        b"RGB3" => PixelFormat::RGB24,
        b"GREY" => PixelFormat::Gray8,
        _ => return Err(format!("Unsupported fourcc {}", format.fourcc)),
    };

    let min_stride = format.width * pixel_format.bytes_per_pixel();
    let stride = format.stride.max(min_stride);
    let frame = CameraFrame {
        width: format.width,
        height: format.height,
        data: Arc::from(buf),
        format: pixel_format,
        stride,
        captured_at: std::time::Instant::now(),
    };

    if !frame.is_complete() {
        return Err(format!(
            "Short buffer: {} bytes for {}x{}",
            buf.len(),
            format.width,
            format.height
        ));
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_yuyv_buffer() {
        let format = Format::new(2, 2, FourCC::new(b"YUYV"));
        let buf = vec![128u8; 8];
        let frame = decode_buffer(&buf, &format).unwrap();
        assert_eq!(frame.format, PixelFormat::YUYV);
        assert_eq!(frame.stride, 4);
        assert!(frame.is_complete());
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let format = Format::new(4, 4, FourCC::new(b"YUYV"));
        assert!(decode_buffer(&[0u8; 8], &format).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_fourcc() {
        let format = Format::new(2, 2, FourCC::new(b"H264"));
        assert!(decode_buffer(&[0u8; 16], &format).is_err());
    }
}
