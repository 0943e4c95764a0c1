// SPDX-License-Identifier: MPL-2.0

//! Analysis backend
//!
//! The service behind `/analyze` is opaque: it takes one image and answers
//! with a prediction label and a confidence percentage.

pub mod client;
pub mod response;

pub use client::AnalysisClient;
pub use response::interpret_response;

use crate::errors::AnalysisError;
use crate::pipelines::photo::SelectedImage;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Successful analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub prediction: String,
    /// Percentage as sent by the server, expected 0-100, not rescaled
    pub confidence: f64,
}

/// Something that can analyze a selected image
pub trait AnalysisBackend: Send + Sync {
    fn analyze(
        &self,
        image: SelectedImage,
    ) -> BoxFuture<'static, Result<AnalysisResult, AnalysisError>>;
}
