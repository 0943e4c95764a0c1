// SPDX-License-Identifier: GPL-3.0-only

//! Frame to RGB conversion
//!
//! Turns a camera frame in any supported pixel layout into an RGB image at the
//! frame's native resolution.

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::PhotoError;
use image::RgbImage;
use tracing::debug;

/// Convert a frame to an RGB image of the same size
pub fn frame_to_rgb(frame: &CameraFrame) -> Result<RgbImage, PhotoError> {
    if !frame.is_complete() {
        return Err(PhotoError::CaptureFailed(format!(
            "Incomplete frame: {} bytes for {}x{} {:?}",
            frame.data.len(),
            frame.width,
            frame.height,
            frame.format
        )));
    }

    let width = frame.width;
    let height = frame.height;

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = sample_pixel_rgb(frame, x, y);
            rgb.push(r);
            rgb.push(g);
            rgb.push(b);
        }
    }

    debug!(width, height, format = ?frame.format, "Converted frame to RGB");

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| PhotoError::CaptureFailed("Failed to create image".to_string()))
}

/// Read one pixel as RGB, clamping coordinates to the frame
pub fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> (u8, u8, u8) {
    let x = x.min(frame.width.saturating_sub(1));
    let y = y.min(frame.height.saturating_sub(1));
    let data: &[u8] = &frame.data;

    match frame.format {
        PixelFormat::RGBA => {
            let idx = (y * frame.stride + x * 4) as usize;
            if idx + 2 < data.len() {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (0, 0, 0)
            }
        }
        PixelFormat::RGB24 => {
            let idx = (y * frame.stride + x * 3) as usize;
            if idx + 2 < data.len() {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (0, 0, 0)
            }
        }
        PixelFormat::Gray8 => {
            let idx = (y * frame.stride + x) as usize;
            match data.get(idx) {
                Some(&v) => (v, v, v),
                None => (0, 0, 0),
            }
        }
        PixelFormat::YUYV => {
            // Y0 U Y1 V: two pixels share chroma
            let base = (y * frame.stride) as usize + ((x & !1) as usize) * 2;
            if base + 3 >= data.len() {
                return (0, 0, 0);
            }
            let luma = if x & 1 == 0 { data[base] } else { data[base + 2] };
            yuv_to_rgb(luma, data[base + 1], data[base + 3])
        }
        PixelFormat::UYVY => {
            // U Y0 V Y1
            let base = (y * frame.stride) as usize + ((x & !1) as usize) * 2;
            if base + 3 >= data.len() {
                return (0, 0, 0);
            }
            let luma = if x & 1 == 0 {
                data[base + 1]
            } else {
                data[base + 3]
            };
            yuv_to_rgb(luma, data[base], data[base + 2])
        }
    }
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}
