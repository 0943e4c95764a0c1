// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture-and-analyze controller

use futures::FutureExt;
use futures::future::BoxFuture;
use image::{Rgb, RgbImage, RgbaImage};
use snapsight::app::{Controller, Driver, Message, Mode, Pending, Region};
use snapsight::backends::analysis::{AnalysisBackend, AnalysisResult};
use snapsight::backends::camera::{
    BackendResult, CameraBackend, CameraDevice, CameraFormat, CameraFrame, CameraStream,
    OpenRequest, StillImageBackend, StreamHandle,
};
use snapsight::errors::{
    AnalysisError, CAMERA_ACCESS_FAILED_MESSAGE, CAMERA_PERMISSION_DENIED_MESSAGE, CameraError,
};
use snapsight::pipelines::photo::{ImageSource, PhotoEncoder, SelectedImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Analysis backend answering every request with the same outcome
struct FakeAnalysis {
    outcome: Result<AnalysisResult, AnalysisError>,
    calls: AtomicUsize,
}

impl FakeAnalysis {
    fn ok(prediction: &str, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(AnalysisResult {
                prediction: prediction.to_string(),
                confidence,
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(error: AnalysisError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisBackend for FakeAnalysis {
    fn analyze(
        &self,
        _image: SelectedImage,
    ) -> BoxFuture<'static, Result<AnalysisResult, AnalysisError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.clone();
        async move {
            tokio::task::yield_now().await;
            outcome
        }
        .boxed()
    }
}

/// Camera backend whose open always fails
struct BrokenCamera(CameraError);

impl CameraBackend for BrokenCamera {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        Vec::new()
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        Vec::new()
    }

    fn open(&self, _request: &OpenRequest) -> BackendResult<StreamHandle> {
        Err(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

/// Camera that opens but never delivers a frame
struct SilentCamera;

struct SilentStream(CameraDevice);

impl CameraStream for SilentStream {
    fn device(&self) -> &CameraDevice {
        &self.0
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        None
    }

    fn stop(&mut self) {}
}

impl CameraBackend for SilentCamera {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        Vec::new()
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        Vec::new()
    }

    fn open(&self, _request: &OpenRequest) -> BackendResult<StreamHandle> {
        Ok(StreamHandle::new(Box::new(SilentStream(CameraDevice {
            name: "Silent".to_string(),
            path: "/dev/video9".to_string(),
            driver: None,
            camera_location: None,
        }))))
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

fn still_camera() -> Arc<StillImageBackend> {
    Arc::new(StillImageBackend::from_image(RgbaImage::from_pixel(
        16,
        12,
        image::Rgba([40, 120, 200, 255]),
    )))
}

fn controller(camera: Arc<dyn CameraBackend>, analysis: Arc<FakeAnalysis>) -> Controller {
    Controller::new(
        camera,
        analysis,
        OpenRequest::default(),
        PhotoEncoder::default(),
    )
}

fn write_png(dir: &Path) -> PathBuf {
    let path = dir.join("cat.png");
    RgbImage::from_pixel(8, 8, Rgb([200, 100, 50]))
        .save(&path)
        .unwrap();
    path
}

/// Derived state that must hold in every settled mode
fn assert_consistent(controller: &Controller, camera: &StillImageBackend) {
    let mode = controller.mode();
    let layout = controller.layout();
    let visible: Vec<Region> = [
        Region::Choice,
        Region::CameraView,
        Region::Preview,
        Region::Loader,
        Region::Result,
        Region::Error,
    ]
    .into_iter()
    .filter(|r| layout.is_visible(*r))
    .collect();
    assert_eq!(visible.len(), 1, "{:?}", mode);

    assert!(camera.active_streams() <= 1);
    assert_eq!(controller.has_stream(), mode == Mode::CameraActive, "{:?}", mode);
    assert_eq!(camera.active_streams(), usize::from(mode == Mode::CameraActive));
    match mode {
        Mode::Idle | Mode::CameraActive => assert!(controller.selected().is_none()),
        Mode::PreviewReady | Mode::Analyzing => assert!(controller.selected().is_some()),
        Mode::ResultShown | Mode::ErrorShown => {}
    }
    if !matches!(mode, Mode::ResultShown | Mode::ErrorShown) {
        assert!(controller.display().lines().is_empty(), "{:?}", mode);
    }
    if mode == Mode::ResultShown {
        assert!(controller.result().is_some());
        assert!(controller.error().is_none());
    }
    if mode == Mode::ErrorShown {
        assert!(controller.result().is_none());
        assert!(controller.error().is_some());
    }
}

#[tokio::test]
async fn test_camera_flow_to_result() {
    let camera = still_camera();
    let analysis = FakeAnalysis::ok("cat", 87.5);
    let mut driver = Driver::new(controller(camera.clone(), analysis.clone()));

    driver.dispatch(Message::UseCamera);
    assert_eq!(driver.controller().mode(), Mode::Idle);
    assert_eq!(driver.controller().pending(), Some(Pending::OpeningCamera));
    driver.settle().await;

    assert_eq!(driver.controller().mode(), Mode::CameraActive);
    assert!(driver.controller().has_stream());
    assert!(driver.controller().live_frame().is_some());
    assert_eq!(camera.active_streams(), 1);

    driver.dispatch(Message::Capture);
    assert_eq!(driver.controller().mode(), Mode::PreviewReady);
    assert_eq!(camera.active_streams(), 0, "capture must release the camera");

    let selected = driver.controller().selected().unwrap();
    assert_eq!(selected.mime, "image/jpeg");
    assert_eq!(selected.filename(), "capture.jpg");
    assert_eq!((selected.width, selected.height), (16, 12));
    assert!(matches!(selected.source, ImageSource::Camera { .. }));

    driver.dispatch(Message::Analyze);
    assert_eq!(driver.controller().mode(), Mode::Analyzing);
    driver.settle().await;

    assert_eq!(driver.controller().mode(), Mode::ResultShown);
    assert_eq!(analysis.calls(), 1);
    assert_eq!(
        driver.controller().display().lines(),
        vec!["Prediction: cat", "Confidence: 87.50%"]
    );
}

#[tokio::test]
async fn test_repeated_use_camera_holds_one_stream() {
    let camera = still_camera();
    let mut driver = Driver::new(controller(camera.clone(), FakeAnalysis::ok("cat", 1.0)));

    // Second request before the first completes
    driver.dispatch(Message::UseCamera);
    driver.dispatch(Message::UseCamera);
    driver.settle().await;
    assert_eq!(driver.controller().mode(), Mode::CameraActive);
    assert_eq!(camera.active_streams(), 1);

    // And again while a stream is live
    driver.dispatch(Message::UseCamera);
    assert_eq!(camera.active_streams(), 0);
    driver.settle().await;
    assert_eq!(camera.active_streams(), 1);
}

#[tokio::test]
async fn test_use_camera_while_opening_opens_once() {
    let camera = still_camera();
    let mut controller = controller(camera.clone(), FakeAnalysis::ok("cat", 1.0));

    let first = controller.update(Message::UseCamera);
    let second = controller.update(Message::UseCamera);
    assert!(second.is_none());
    assert_eq!(controller.pending(), Some(Pending::OpeningCamera));

    // Run every outstanding open before applying any completion
    let opened = first.into_future().unwrap().await;
    assert_eq!(camera.active_streams(), 1);

    let _ = controller.update(opened);
    assert_eq!(controller.mode(), Mode::CameraActive);
    assert_eq!(camera.active_streams(), 1);
}

#[tokio::test]
async fn test_camera_request_waits_for_superseded_open() {
    let camera = still_camera();
    let mut controller = controller(camera.clone(), FakeAnalysis::ok("cat", 1.0));

    let first = controller.update(Message::UseCamera);
    let _upload = controller.update(Message::Upload(PathBuf::from("missing.png")));
    let held = controller.update(Message::UseCamera);
    assert!(held.is_none());
    assert_eq!(controller.pending(), Some(Pending::OpeningCamera));

    let stale = first.into_future().unwrap().await;
    assert_eq!(camera.active_streams(), 1);

    // Releasing the superseded stream starts the held request
    let reopen = controller.update(stale);
    assert_eq!(camera.active_streams(), 0);
    assert_eq!(controller.mode(), Mode::Idle);

    let opened = reopen.into_future().unwrap().await;
    assert_eq!(camera.active_streams(), 1);
    let _ = controller.update(opened);
    assert_eq!(controller.mode(), Mode::CameraActive);
    assert!(controller.has_stream());
    assert_eq!(camera.active_streams(), 1);
}

#[tokio::test]
async fn test_start_over_releases_stream() {
    let camera = still_camera();
    let mut driver = Driver::new(controller(camera.clone(), FakeAnalysis::ok("cat", 1.0)));

    driver.dispatch(Message::UseCamera);
    driver.settle().await;
    assert_eq!(camera.active_streams(), 1);

    driver.dispatch(Message::StartOver);
    assert_eq!(driver.controller().mode(), Mode::Idle);
    assert!(!driver.controller().has_stream());
    assert_eq!(camera.active_streams(), 0);

    // Repeating is harmless
    driver.dispatch(Message::StartOver);
    assert_eq!(driver.controller().mode(), Mode::Idle);
    assert!(driver.controller().display().lines().is_empty());
}

#[tokio::test]
async fn test_dropping_controller_releases_stream() {
    let camera = still_camera();
    let mut driver = Driver::new(controller(camera.clone(), FakeAnalysis::ok("cat", 1.0)));
    driver.dispatch(Message::UseCamera);
    driver.settle().await;
    assert_eq!(camera.active_streams(), 1);

    drop(driver);
    assert_eq!(camera.active_streams(), 0);
}

#[tokio::test]
async fn test_stale_camera_completion_is_released() {
    let camera = still_camera();
    let mut controller = controller(camera.clone(), FakeAnalysis::ok("cat", 1.0));

    let opening = controller.update(Message::UseCamera);
    let _ = controller.update(Message::StartOver);

    // The open finishes after the reset
    let completion = opening.into_future().unwrap().await;
    assert_eq!(camera.active_streams(), 1);
    let _ = controller.update(completion);

    assert_eq!(controller.mode(), Mode::Idle);
    assert!(!controller.has_stream());
    assert_eq!(camera.active_streams(), 0);
}

#[tokio::test]
async fn test_permission_denied_message() {
    let camera = Arc::new(BrokenCamera(CameraError::PermissionDenied));
    let mut driver = Driver::new(controller(camera, FakeAnalysis::ok("cat", 1.0)));

    driver.dispatch(Message::UseCamera);
    driver.settle().await;

    let controller = driver.controller();
    assert_eq!(controller.mode(), Mode::ErrorShown);
    assert_eq!(controller.error(), Some(CAMERA_PERMISSION_DENIED_MESSAGE));
    assert_eq!(
        controller.display().lines(),
        vec![
            "Analysis Failed".to_string(),
            format!("Error: {}", CAMERA_PERMISSION_DENIED_MESSAGE)
        ]
    );
}

#[tokio::test]
async fn test_other_camera_failure_message() {
    for error in [CameraError::NoCameraFound, CameraError::Busy] {
        let camera = Arc::new(BrokenCamera(error));
        let mut driver = Driver::new(controller(camera, FakeAnalysis::ok("cat", 1.0)));

        driver.dispatch(Message::UseCamera);
        driver.settle().await;

        assert_eq!(driver.controller().mode(), Mode::ErrorShown);
        assert_eq!(driver.controller().error(), Some(CAMERA_ACCESS_FAILED_MESSAGE));
    }
}

#[tokio::test]
async fn test_capture_without_frame_keeps_camera() {
    let mut driver = Driver::new(controller(Arc::new(SilentCamera), FakeAnalysis::ok("cat", 1.0)));
    driver.dispatch(Message::UseCamera);
    driver.settle().await;
    assert_eq!(driver.controller().mode(), Mode::CameraActive);

    driver.dispatch(Message::Capture);
    assert_eq!(driver.controller().mode(), Mode::CameraActive);
    assert!(driver.controller().selected().is_none());
    assert!(driver.controller().has_stream());
}

#[tokio::test]
async fn test_actions_outside_their_mode_are_ignored() {
    let camera = still_camera();
    let analysis = FakeAnalysis::ok("cat", 1.0);
    let mut driver = Driver::new(controller(camera.clone(), analysis.clone()));

    driver.dispatch(Message::Analyze);
    driver.dispatch(Message::Capture);
    assert_eq!(driver.controller().mode(), Mode::Idle);
    assert_eq!(driver.in_flight(), 0);

    driver.dispatch(Message::UseCamera);
    driver.settle().await;
    driver.dispatch(Message::Analyze);
    assert_eq!(driver.controller().mode(), Mode::CameraActive);
    assert_eq!(analysis.calls(), 0);
}

#[tokio::test]
async fn test_double_submit_sends_once() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = FakeAnalysis::ok("dog", 42.0);
    let mut driver = Driver::new(controller(still_camera(), analysis.clone()));

    driver.dispatch(Message::Upload(write_png(dir.path())));
    driver.settle().await;
    assert_eq!(driver.controller().mode(), Mode::PreviewReady);

    driver.dispatch(Message::Analyze);
    driver.dispatch(Message::Analyze);
    driver.settle().await;

    assert_eq!(analysis.calls(), 1);
    assert_eq!(driver.controller().mode(), Mode::ResultShown);
}

#[tokio::test]
async fn test_stale_analysis_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = FakeAnalysis::ok("dog", 42.0);
    let mut driver = Driver::new(controller(still_camera(), analysis.clone()));

    driver.dispatch(Message::Upload(write_png(dir.path())));
    driver.settle().await;
    driver.dispatch(Message::Analyze);
    driver.dispatch(Message::StartOver);
    driver.settle().await;

    assert_eq!(analysis.calls(), 1);
    assert_eq!(driver.controller().mode(), Mode::Idle);
    assert!(driver.controller().result().is_none());
    assert!(driver.controller().display().lines().is_empty());
}

#[tokio::test]
async fn test_upload_flow_to_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path());
    let analysis = FakeAnalysis::failing(AnalysisError::Server {
        status: 500,
        message: Some("model unavailable".to_string()),
    });
    let mut driver = Driver::new(controller(still_camera(), analysis));

    driver.dispatch(Message::Upload(path.clone()));
    assert_eq!(driver.controller().pending(), Some(Pending::LoadingImage));
    driver.settle().await;

    let selected = driver.controller().selected().unwrap();
    assert_eq!(selected.mime, "image/png");
    assert_eq!(&selected.bytes[..], &std::fs::read(&path).unwrap()[..]);
    assert_eq!(selected.source, ImageSource::Upload { path });

    driver.dispatch(Message::Analyze);
    driver.settle().await;

    assert_eq!(driver.controller().mode(), Mode::ErrorShown);
    let display = driver.controller().display();
    assert_eq!(display.result_text.as_deref(), Some("Analysis Failed"));
    assert_eq!(display.confidence_text.as_deref(), Some(""));
    assert_eq!(display.error_text.as_deref(), Some("Error: model unavailable"));
}

#[tokio::test]
async fn test_upload_of_non_image_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not an image").unwrap();

    let mut driver = Driver::new(controller(still_camera(), FakeAnalysis::ok("cat", 1.0)));
    driver.dispatch(Message::Upload(path));
    driver.settle().await;

    assert_eq!(driver.controller().mode(), Mode::ErrorShown);
    assert_eq!(driver.controller().error(), Some("Unsupported image format"));
}

#[tokio::test]
async fn test_camera_request_supersedes_upload() {
    let dir = tempfile::tempdir().unwrap();
    let camera = still_camera();
    let mut driver = Driver::new(controller(camera.clone(), FakeAnalysis::ok("cat", 1.0)));

    driver.dispatch(Message::Upload(write_png(dir.path())));
    driver.dispatch(Message::UseCamera);
    driver.settle().await;

    assert_eq!(driver.controller().mode(), Mode::CameraActive);
    assert!(driver.controller().selected().is_none());
    assert_eq!(camera.active_streams(), 1);
}

#[tokio::test]
async fn test_action_sequences_stay_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path());
    let actions = ["camera", "upload", "capture", "analyze", "reset"];

    for settle_between in [true, false] {
        for a in actions {
            for b in actions {
                for c in actions {
                    let camera = still_camera();
                    let mut driver =
                        Driver::new(controller(camera.clone(), FakeAnalysis::ok("cat", 50.0)));

                    for action in [a, b, c] {
                        let message = match action {
                            "camera" => Message::UseCamera,
                            "upload" => Message::Upload(path.clone()),
                            "capture" => Message::Capture,
                            "analyze" => Message::Analyze,
                            _ => Message::StartOver,
                        };
                        driver.dispatch(message);
                        if settle_between {
                            driver.settle().await;
                            assert_consistent(driver.controller(), &camera);
                        }
                    }

                    driver.settle().await;
                    assert_consistent(driver.controller(), &camera);
                }
            }
        }
    }
}
