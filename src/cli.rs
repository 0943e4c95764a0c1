// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Analyzing a local file or a remote URL
//! - Capturing one still and analyzing it
//!
//! Headless flows drive the same controller as the terminal UI, so they end
//! in the same modes and print the same result text.

use snapsight::app::{Controller, Driver, Message, Mode, view};
use snapsight::backends::analysis::AnalysisClient;
use snapsight::backends::camera::{self, CameraBackend, CameraFormat};
use snapsight::config::Config;
use snapsight::constants::camera_timing;
use snapsight::errors::{AppError, AppResult, PhotoError};
use snapsight::storage;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// List all available cameras
pub fn list_cameras(config: &Config) -> AppResult<()> {
    let backend = camera::get_backend(config, None);
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, device) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, device.name);
        println!("      Path: {}", device.path);
        if let Some(location) = &device.camera_location {
            println!("      Location: {}", location);
        }

        let formats = backend.get_formats(device);
        if !formats.is_empty() {
            println!("      Formats: {}", summarize_formats(&formats));
        }
        println!();
    }

    Ok(())
}

/// Top resolutions with their best framerate, highest first
fn summarize_formats(formats: &[CameraFormat]) -> String {
    let mut resolutions: Vec<(u32, u32, u32)> = Vec::new();
    for format in formats {
        let fps = format.framerate.unwrap_or(30);
        if let Some(existing) = resolutions
            .iter_mut()
            .find(|(w, h, _)| *w == format.width && *h == format.height)
        {
            if fps > existing.2 {
                existing.2 = fps;
            }
        } else {
            resolutions.push((format.width, format.height, fps));
        }
    }

    resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

    resolutions
        .iter()
        .take(3)
        .map(|(w, h, fps)| format!("{}x{}@{}fps", w, h, fps))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Upload a local file and analyze it
pub fn analyze_file(
    config: &Config,
    file: PathBuf,
) -> AppResult<ExitCode> {
    if !storage::is_supported_image(&file) {
        warn!(path = %file.display(), "File extension is not a known image type");
    }

    let runtime = build_runtime()?;
    let controller = Controller::from_config(config, camera::get_backend(config, None))
        .map_err(AppError::Config)?;

    let code = runtime.block_on(async move {
        let mut driver = Driver::new(controller);

        driver.dispatch(Message::Upload(file));
        driver.settle().await;

        submit(&mut driver).await;
        report(driver.controller())
    });

    Ok(code)
}

/// Let the service fetch and analyze a remote image
pub fn analyze_url(config: &Config, url: &str) -> AppResult<ExitCode> {
    let runtime = build_runtime()?;
    let client = AnalysisClient::from_config(config).map_err(AppError::Config)?;

    let display = runtime.block_on(async {
        match client.analyze_url(url).await {
            Ok(result) => view::Display::build(Mode::ResultShown, Some(&result), None),
            Err(e) => {
                view::Display::build(Mode::ErrorShown, None, Some(e.user_message().as_str()))
            }
        }
    });

    Ok(print_display(&display))
}

/// Open a camera, take one still after warm-up, and analyze it
pub fn capture_and_analyze(
    config: &Config,
    camera_source: Option<PathBuf>,
) -> AppResult<ExitCode> {
    let runtime = build_runtime()?;
    let backend: Arc<dyn CameraBackend> = camera::get_backend(config, camera_source);
    let controller = Controller::from_config(config, backend).map_err(AppError::Config)?;

    let code = runtime.block_on(async move {
        let mut driver = Driver::new(controller);

        println!("Opening camera...");
        match capture(&mut driver, camera_timing::FIRST_FRAME_TIMEOUT).await {
            Ok(()) => {
                submit(&mut driver).await;
                report(driver.controller())
            }
            Err(e) => {
                error!(error = %e, "Capture failed");
                let message = e.to_string();
                print_display(&view::Display::build(
                    Mode::ErrorShown,
                    None,
                    Some(message.as_str()),
                ))
            }
        }
    });

    Ok(code)
}

/// Open the camera and take one still once frames arrive
///
/// A camera that opens but never delivers a frame is released and reported
/// as `NoFrameAvailable`. Open failures are left in the controller's error
/// state.
async fn capture(driver: &mut Driver, frame_timeout: Duration) -> Result<(), PhotoError> {
    driver.dispatch(Message::UseCamera);
    driver.settle().await;

    if driver.controller().mode() != Mode::CameraActive {
        return Ok(());
    }

    if !wait_for_frame(driver, frame_timeout).await {
        driver.dispatch(Message::StartOver);
        return Err(PhotoError::NoFrameAvailable);
    }

    println!("Capturing...");
    driver.dispatch(Message::Capture);
    Ok(())
}

/// Wait out the warm-up period, then until a frame is available
async fn wait_for_frame(driver: &Driver, timeout: Duration) -> bool {
    let start = Instant::now();
    let mut seen_frame = false;

    while start.elapsed() < timeout {
        seen_frame = driver.controller().live_frame().is_some();
        // After warmup period, use the next good frame
        if seen_frame && start.elapsed() > camera_timing::WARMUP {
            break;
        }
        tokio::time::sleep(camera_timing::FRAME_POLL_INTERVAL).await;
    }

    if seen_frame {
        info!(elapsed = ?start.elapsed(), "Camera ready");
    } else {
        warn!(timeout = ?timeout, "No frame received from camera");
    }
    seen_frame
}

/// Analyze the selected image, if there is one
async fn submit(driver: &mut Driver) {
    if driver.controller().mode() != Mode::PreviewReady {
        return;
    }
    if let Some(image) = driver.controller().selected() {
        println!("Analyzing {}x{} image...", image.width, image.height);
    }
    driver.dispatch(Message::Analyze);
    driver.settle().await;
}

/// Print the outcome and pick the exit status
fn report(controller: &Controller) -> ExitCode {
    match controller.mode() {
        Mode::ResultShown | Mode::ErrorShown => print_display(&controller.display()),
        other => {
            eprintln!("Flow stopped in {} state", other.label());
            ExitCode::FAILURE
        }
    }
}

/// Print result or error lines; failure when an error is shown
fn print_display(display: &view::Display) -> ExitCode {
    for line in display.lines() {
        println!("{}", line);
    }
    if display.error_text.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}
