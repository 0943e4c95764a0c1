// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture-and-analyze flow

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// User-facing copy for a denied camera permission
pub const CAMERA_PERMISSION_DENIED_MESSAGE: &str =
    "Camera access was denied. Please allow access to the camera device and try again.";

/// User-facing copy for every other camera access failure
pub const CAMERA_ACCESS_FAILED_MESSAGE: &str =
    "Could not access camera. Please ensure it is connected and you have granted permission.";

/// Fallback when a transport failure carries no message
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Photo capture errors
    Photo(PhotoError),
    /// Analysis request errors
    Analysis(AnalysisError),
    /// Configuration errors
    Config(String),
    /// Terminal, runtime or filesystem I/O
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The OS refused access to the device
    PermissionDenied,
    /// No camera devices found
    NoCameraFound,
    /// Camera initialization failed
    InitializationFailed(String),
    /// Camera disconnected during operation
    Disconnected,
    /// Invalid camera format
    InvalidFormat(String),
    /// Backend error
    BackendError(String),
    /// Camera is busy or in use
    Busy,
}

impl CameraError {
    /// Classify an I/O error raised while opening or configuring a device
    pub fn from_io(err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            return CameraError::PermissionDenied;
        }
        match err.raw_os_error() {
            Some(libc::EACCES) | Some(libc::EPERM) => CameraError::PermissionDenied,
            Some(libc::EBUSY) => CameraError::Busy,
            Some(libc::ENOENT) | Some(libc::ENODEV) | Some(libc::ENXIO) => {
                CameraError::NoCameraFound
            }
            _ if err.kind() == std::io::ErrorKind::NotFound => CameraError::NoCameraFound,
            _ => CameraError::InitializationFailed(err.to_string()),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CameraError::PermissionDenied)
    }

    /// Message shown in the error region
    ///
    /// Permission failures get their own copy; everything else shares the
    /// generic access-failure copy.
    pub fn user_message(&self) -> &'static str {
        if self.is_permission_denied() {
            CAMERA_PERMISSION_DENIED_MESSAGE
        } else {
            CAMERA_ACCESS_FAILED_MESSAGE
        }
    }
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// No frame available for capture
    NoFrameAvailable,
    /// Capture failed
    CaptureFailed(String),
    /// Encoding failed
    EncodingFailed(String),
}

/// Failures of a single analysis request
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Request could not be built, sent, or its body could not be read
    Transport(String),
    /// Server answered with a non-success status
    Server {
        status: u16,
        /// `error` field of the JSON body, if one was present
        message: Option<String>,
    },
    /// Success status but the body is not a usable result
    Malformed(String),
}

impl AnalysisError {
    /// Message shown in the error region
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Transport(msg) if msg.trim().is_empty() => {
                UNKNOWN_ERROR_MESSAGE.to_string()
            }
            AnalysisError::Transport(msg) => msg.clone(),
            AnalysisError::Server {
                message: Some(msg), ..
            } if !msg.is_empty() => msg.clone(),
            AnalysisError::Server { status, .. } => format!("HTTP error! status: {}", status),
            AnalysisError::Malformed(msg) => format!("Malformed response: {}", msg),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Analysis(e) => write!(f, "Analysis error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Permission denied"),
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::Disconnected => write!(f, "Camera disconnected"),
            CameraError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
            CameraError::Busy => write!(f, "Camera is busy"),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AnalysisError::Server { status, message } => match message {
                Some(msg) => write!(f, "Server returned {}: {}", status, msg),
                None => write!(f, "Server returned {}", status),
            },
            AnalysisError::Malformed(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}
impl std::error::Error for AnalysisError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::Analysis(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}
