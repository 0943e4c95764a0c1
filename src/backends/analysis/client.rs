// SPDX-License-Identifier: GPL-3.0-only

//! HTTP client for the analysis endpoint

use super::response::interpret_response;
use super::{AnalysisBackend, AnalysisResult};
use crate::config::Config;
use crate::constants::wire;
use crate::errors::AnalysisError;
use crate::pipelines::photo::SelectedImage;
use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, error, info};

/// Client for `POST /analyze`
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    endpoint: reqwest::Url,
}

impl AnalysisClient {
    /// Create a client for an endpoint URL
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, String> {
        let endpoint = reqwest::Url::parse(endpoint)
            .map_err(|e| format!("Invalid endpoint '{}': {}", endpoint, e))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("snapsight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self { http, endpoint })
    }

    pub fn from_config(config: &Config) -> Result<Self, String> {
        Self::new(&config.endpoint, config.request_timeout())
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// Submit an image as a single multipart `file` field named `capture.jpg`
    pub async fn analyze_image(
        &self,
        image: &SelectedImage,
    ) -> Result<AnalysisResult, AnalysisError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        info!(
            request_id = %request_id,
            endpoint = %self.endpoint,
            size = image.len(),
            mime = %image.mime,
            "Submitting image for analysis"
        );

        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.filename())
            .mime_str(&image.mime)
            .map_err(|e| AnalysisError::Transport(format!("Invalid MIME type: {}", e)))?;
        let form = Form::new().part(wire::FILE_FIELD, part);

        let request = self
            .http
            .post(self.endpoint.clone())
            .header(wire::REQUEST_ID_HEADER, &request_id)
            .multipart(form);

        self.send(request, &request_id).await
    }

    /// Ask the server to fetch and analyze an image by URL
    pub async fn analyze_url(&self, url: &str) -> Result<AnalysisResult, AnalysisError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        info!(request_id = %request_id, url, "Submitting image URL for analysis");

        let request = self
            .http
            .post(self.endpoint.clone())
            .header(wire::REQUEST_ID_HEADER, &request_id)
            .json(&serde_json::json!({ "url": url }));

        self.send(request, &request_id).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        request_id: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mut response = request.send().await.map_err(|e| {
            error!(request_id, error = %e, "Analysis request failed to send");
            AnalysisError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        debug!(request_id, status, "Analysis response received");

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?
        {
            if body.len() + chunk.len() > wire::MAX_RESPONSE_BYTES {
                error!(request_id, status, "Analysis response too large");
                return Err(if (200..300).contains(&status) {
                    AnalysisError::Malformed(format!(
                        "response exceeded {} bytes",
                        wire::MAX_RESPONSE_BYTES
                    ))
                } else {
                    AnalysisError::Server {
                        status,
                        message: None,
                    }
                });
            }
            body.extend_from_slice(&chunk);
        }

        interpret_response(status, &body)
    }
}

impl AnalysisBackend for AnalysisClient {
    fn analyze(
        &self,
        image: SelectedImage,
    ) -> BoxFuture<'static, Result<AnalysisResult, AnalysisError>> {
        let client = self.clone();
        async move { client.analyze_image(&image).await }.boxed()
    }
}
