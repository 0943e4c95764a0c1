// SPDX-License-Identifier: GPL-3.0-only

//! Capture-and-analyze controller
//!
//! Follows a message/update design: every user action and every asynchronous
//! completion is a [`Message`]; [`Controller::update`] applies it and may
//! return a [`Task`] whose output is the next message.
//!
//! Completions carry the generation that was current when their work started.
//! Any later user action bumps the generation, so a completion that arrives
//! after a reset, a second camera request, or a new upload is dropped.
//!
//! Only one camera open runs at a time. A camera request made while an older
//! open is still running waits for that open to finish and be released.

pub mod driver;
pub mod state;
pub mod task;
pub mod view;

pub use driver::Driver;
pub use state::{Control, Layout, Mode, Region};
pub use task::Task;
pub use view::Display;

use crate::backends::analysis::{AnalysisBackend, AnalysisClient, AnalysisResult};
use crate::backends::camera::types::{CameraFrame, OpenRequest};
use crate::backends::camera::{CameraBackend, StreamHandle, open_request};
use crate::config::Config;
use crate::errors::{AnalysisError, CameraError, PhotoError};
use crate::pipelines::photo::{PhotoCapture, PhotoEncoder, SelectedImage};
use crate::storage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Actions and completions
#[derive(Debug)]
pub enum Message {
    /// Request a camera stream
    UseCamera,
    /// Use a local image file
    Upload(PathBuf),
    /// Take the current camera frame as the selected image
    Capture,
    /// Submit the selected image
    Analyze,
    /// Drop everything and return to the initial choice
    StartOver,
    /// Camera request finished
    CameraOpened(u64, Result<StreamHandle, CameraError>),
    /// File read and decode finished
    ImageLoaded(u64, Result<SelectedImage, String>),
    /// Analysis request finished
    AnalysisFinished(u64, Result<AnalysisResult, AnalysisError>),
}

/// Work started but not yet reflected in the mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    OpeningCamera,
    LoadingImage,
}

/// The controller
pub struct Controller {
    mode: Mode,
    generation: u64,
    pending: Option<Pending>,
    /// Open camera stream; only ever `Some` in CameraActive
    stream: Option<StreamHandle>,
    /// A `CameraBackend::open` call has not reported back yet
    opening: bool,
    selected: Option<SelectedImage>,
    result: Option<AnalysisResult>,
    error: Option<String>,
    camera: Arc<dyn CameraBackend>,
    analysis: Arc<dyn AnalysisBackend>,
    open_request: OpenRequest,
    encoder: PhotoEncoder,
}

impl Controller {
    pub fn new(
        camera: Arc<dyn CameraBackend>,
        analysis: Arc<dyn AnalysisBackend>,
        open_request: OpenRequest,
        encoder: PhotoEncoder,
    ) -> Self {
        Self {
            mode: Mode::Idle,
            generation: 0,
            pending: None,
            stream: None,
            opening: false,
            selected: None,
            result: None,
            error: None,
            camera,
            analysis,
            open_request,
            encoder,
        }
    }

    /// Controller posting to the configured endpoint
    pub fn from_config(config: &Config, camera: Arc<dyn CameraBackend>) -> Result<Self, String> {
        let client = AnalysisClient::from_config(config)?;
        Ok(Self::new(
            camera,
            Arc::new(client),
            open_request(config),
            PhotoEncoder::new(config.jpeg_quality),
        ))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn layout(&self) -> Layout {
        self.mode.layout()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    pub fn has_stream(&self) -> bool {
        self.stream.as_ref().is_some_and(StreamHandle::is_live)
    }

    /// Latest frame of the live view
    pub fn live_frame(&self) -> Option<CameraFrame> {
        self.stream.as_ref().and_then(StreamHandle::latest_frame)
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn display(&self) -> Display {
        Display::build(self.mode, self.result.as_ref(), self.error.as_deref())
    }

    pub fn camera_backend(&self) -> &Arc<dyn CameraBackend> {
        &self.camera
    }

    /// Apply a message
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::UseCamera => self.use_camera(),
            Message::Upload(path) => self.upload(path),
            Message::Capture => {
                self.capture();
                Task::none()
            }
            Message::Analyze => self.analyze(),
            Message::StartOver => {
                self.start_over();
                Task::none()
            }
            Message::CameraOpened(generation, result) => self.on_camera_opened(generation, result),
            Message::ImageLoaded(generation, result) => {
                self.on_image_loaded(generation, result);
                Task::none()
            }
            Message::AnalysisFinished(generation, result) => {
                self.on_analysis_finished(generation, result);
                Task::none()
            }
        }
    }

    // =========================================================================
    // User actions
    // =========================================================================

    fn use_camera(&mut self) -> Task<Message> {
        if self.pending == Some(Pending::OpeningCamera) {
            debug!(generation = self.generation, "Camera request already pending");
            return Task::none();
        }
        self.start_over();
        self.pending = Some(Pending::OpeningCamera);

        if self.opening {
            debug!(
                generation = self.generation,
                "Waiting for the previous camera open to finish"
            );
            return Task::none();
        }
        self.open_camera()
    }

    /// Start `CameraBackend::open` for the current generation
    fn open_camera(&mut self) -> Task<Message> {
        self.opening = true;

        let generation = self.generation;
        let camera = Arc::clone(&self.camera);
        let request = self.open_request.clone();
        info!(generation, backend = camera.name(), facing = %request.facing, "Requesting camera");

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || camera.open(&request))
                    .await
                    .unwrap_or_else(|e| {
                        Err(CameraError::InitializationFailed(format!(
                            "Camera task error: {}",
                            e
                        )))
                    })
            },
            move |result| Message::CameraOpened(generation, result),
        )
    }

    fn upload(&mut self, path: PathBuf) -> Task<Message> {
        self.start_over();
        self.pending = Some(Pending::LoadingImage);

        let generation = self.generation;
        info!(generation, path = %path.display(), "Loading upload");

        Task::perform(storage::load_image_file(path), move |result| {
            Message::ImageLoaded(generation, result)
        })
    }

    fn capture(&mut self) {
        if self.mode != Mode::CameraActive {
            debug!(mode = ?self.mode, "Capture ignored outside camera mode");
            return;
        }
        let Some(stream) = self.stream.as_ref() else {
            warn!("Camera mode without a stream");
            return;
        };

        match PhotoCapture::capture_from_stream(stream, &self.encoder) {
            Ok(image) => {
                self.release_stream();
                info!(width = image.width, height = image.height, "Captured still");
                self.selected = Some(image);
                self.mode = Mode::PreviewReady;
            }
            Err(PhotoError::NoFrameAvailable) => {
                warn!("No frame available yet, capture ignored");
            }
            Err(e) => {
                error!(error = %e, "Capture failed");
                self.release_stream();
                self.show_error(e.to_string());
            }
        }
    }

    fn analyze(&mut self) -> Task<Message> {
        // Only PreviewReady offers Analyze; this also rejects double submits
        if self.mode != Mode::PreviewReady {
            debug!(mode = ?self.mode, "Analyze ignored");
            return Task::none();
        }
        let Some(image) = self.selected.clone() else {
            warn!("Preview mode without a selected image");
            return Task::none();
        };

        self.generation += 1;
        self.result = None;
        self.error = None;
        self.mode = Mode::Analyzing;

        let generation = self.generation;
        info!(generation, size = image.len(), "Starting analysis");

        Task::perform(self.analysis.analyze(image), move |result| {
            Message::AnalysisFinished(generation, result)
        })
    }

    /// Return to the initial choice. Safe to repeat.
    pub fn start_over(&mut self) {
        self.release_stream();
        self.selected = None;
        self.result = None;
        self.error = None;
        self.pending = None;
        self.generation += 1;
        if self.mode != Mode::Idle {
            debug!(from = ?self.mode, "Starting over");
        }
        self.mode = Mode::Idle;
    }

    // =========================================================================
    // Completions
    // =========================================================================

    fn is_current(&self, generation: u64, what: &str) -> bool {
        if generation == self.generation {
            true
        } else {
            debug!(
                generation,
                current = self.generation,
                what,
                "Dropping stale completion"
            );
            false
        }
    }

    fn on_camera_opened(
        &mut self,
        generation: u64,
        result: Result<StreamHandle, CameraError>,
    ) -> Task<Message> {
        self.opening = false;

        if !self.is_current(generation, "camera") {
            if let Ok(mut stale) = result {
                stale.release();
            }
            // A newer camera request was held back by this open
            if self.pending == Some(Pending::OpeningCamera) {
                return self.open_camera();
            }
            return Task::none();
        }
        self.pending = None;

        match result {
            Ok(handle) => {
                // Never hold two streams
                self.release_stream();
                info!(device = ?handle.device().map(|d| &d.path), "Camera active");
                self.stream = Some(handle);
                self.mode = Mode::CameraActive;
            }
            Err(e) => {
                error!(error = %e, "Error accessing camera");
                self.show_error(e.user_message().to_string());
            }
        }
        Task::none()
    }

    fn on_image_loaded(&mut self, generation: u64, result: Result<SelectedImage, String>) {
        if !self.is_current(generation, "upload") {
            return;
        }
        self.pending = None;

        match result {
            Ok(image) => {
                self.selected = Some(image);
                self.mode = Mode::PreviewReady;
            }
            Err(e) => {
                error!(error = %e, "Error loading image");
                self.show_error(e);
            }
        }
    }

    fn on_analysis_finished(
        &mut self,
        generation: u64,
        result: Result<AnalysisResult, AnalysisError>,
    ) {
        if !self.is_current(generation, "analysis") || self.mode != Mode::Analyzing {
            return;
        }

        match result {
            Ok(result) => {
                info!(prediction = %result.prediction, confidence = result.confidence, "Analysis result");
                self.result = Some(result);
                self.mode = Mode::ResultShown;
            }
            Err(e) => {
                error!(error = %e, "Error analyzing image");
                self.show_error(e.user_message());
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }

    fn show_error(&mut self, message: String) {
        self.result = None;
        self.error = Some(message);
        self.mode = Mode::ErrorShown;
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.release_stream();
    }
}
