// SPDX-License-Identifier: GPL-3.0-only

//! Controller state
//!
//! The mode is the only stored UI state. Which region is visible and which
//! controls are offered are derived from it, so they cannot drift apart.

/// Logical UI state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Choice between camera and upload
    #[default]
    Idle,
    /// Live camera view, capture available
    CameraActive,
    /// An image is selected and can be analyzed
    PreviewReady,
    /// Request in flight
    Analyzing,
    /// Prediction on screen
    ResultShown,
    /// Failure on screen
    ErrorShown,
}

/// A displayable area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// "Use camera" / "Upload" choice
    Choice,
    CameraView,
    Preview,
    Loader,
    Result,
    Error,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::Choice,
        Region::CameraView,
        Region::Preview,
        Region::Loader,
        Region::Result,
        Region::Error,
    ];
}

/// User actions offered on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    UseCamera,
    Upload,
    Capture,
    Analyze,
    StartOver,
}

/// Everything the display layer needs to know about visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub region: Region,
    pub controls: &'static [Control],
}

impl Layout {
    pub fn is_visible(&self, region: Region) -> bool {
        self.region == region
    }

    pub fn offers(&self, control: Control) -> bool {
        self.controls.contains(&control)
    }
}

impl Mode {
    /// The single region shown in this mode
    pub fn region(&self) -> Region {
        match self {
            Mode::Idle => Region::Choice,
            Mode::CameraActive => Region::CameraView,
            Mode::PreviewReady => Region::Preview,
            Mode::Analyzing => Region::Loader,
            Mode::ResultShown => Region::Result,
            Mode::ErrorShown => Region::Error,
        }
    }

    pub fn layout(&self) -> Layout {
        let controls: &'static [Control] = match self {
            Mode::Idle => &[Control::UseCamera, Control::Upload],
            Mode::CameraActive => &[Control::Capture, Control::StartOver],
            Mode::PreviewReady => &[Control::Analyze, Control::StartOver],
            Mode::Analyzing => &[Control::StartOver],
            Mode::ResultShown | Mode::ErrorShown => &[Control::StartOver],
        };
        Layout {
            region: self.region(),
            controls,
        }
    }

    /// Short label for status bars and logs
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "Ready",
            Mode::CameraActive => "Camera",
            Mode::PreviewReady => "Preview",
            Mode::Analyzing => "Analyzing...",
            Mode::ResultShown => "Result",
            Mode::ErrorShown => "Error",
        }
    }
}
