// SPDX-License-Identifier: MPL-2.0

//! Snapsight - capture or pick an image and have it classified
//!
//! A small client for an image analysis service. The user either opens a
//! camera and takes a still, or picks a local file; the image is posted to
//! the service and the prediction is shown.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Controller state machine, message loop and display text
//! - [`backends`]: Camera access and the analysis service client
//! - [`pipelines`]: Frame conversion and JPEG encoding of stills
//! - [`config`]: User configuration handling
//! - [`storage`]: Loading user-picked image files
//! - [`terminal`]: Interactive terminal front end
//!
//! # Example
//!
//! ```ignore
//! // Interactive session in the terminal:
//! // snapsight
//! // One-shot analysis of a file:
//! // snapsight analyze photo.jpg
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{Controller, Driver, Message, Mode};
pub use backends::analysis::{AnalysisClient, AnalysisResult};
pub use config::Config;
pub use constants::EncodingQuality;
