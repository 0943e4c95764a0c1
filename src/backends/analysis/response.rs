// SPDX-License-Identifier: GPL-3.0-only

//! Interpreting analysis responses
//!
//! Kept apart from the HTTP client so the status/body rules can be exercised
//! without a server.

use super::AnalysisResult;
use crate::errors::AnalysisError;
use serde::Deserialize;
use tracing::{debug, warn};

/// Body shape on success; fields optional so missing ones are reported, not defaulted
#[derive(Debug, Deserialize)]
struct SuccessBody {
    prediction: Option<String>,
    confidence: Option<f64>,
}

/// Body shape on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Turn a status code and body into a result
pub fn interpret_response(status: u16, body: &[u8]) -> Result<AnalysisResult, AnalysisError> {
    if !(200..300).contains(&status) {
        // Unparsable bodies fall back to the status-derived message
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty());

        warn!(status, message = ?message, "Analysis request failed");
        return Err(AnalysisError::Server { status, message });
    }

    let parsed: SuccessBody = serde_json::from_slice(body)
        .map_err(|e| AnalysisError::Malformed(format!("invalid JSON: {}", e)))?;

    let prediction = parsed
        .prediction
        .ok_or_else(|| AnalysisError::Malformed("missing prediction".to_string()))?;
    let confidence = parsed
        .confidence
        .ok_or_else(|| AnalysisError::Malformed("missing confidence".to_string()))?;

    if !confidence.is_finite() {
        return Err(AnalysisError::Malformed(
            "confidence is not a number".to_string(),
        ));
    }

    debug!(prediction = %prediction, confidence, "Analysis succeeded");
    Ok(AnalysisResult {
        prediction,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let result =
            interpret_response(200, br#"{ "prediction": "cat", "confidence": 87.5 }"#).unwrap();
        assert_eq!(result.prediction, "cat");
        assert_eq!(result.confidence, 87.5);
    }

    #[test]
    fn test_server_error_with_message() {
        let err = interpret_response(500, br#"{ "error": "model unavailable" }"#).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Server {
                status: 500,
                message: Some("model unavailable".to_string())
            }
        );
        assert_eq!(err.user_message(), "model unavailable");
    }

    #[test]
    fn test_server_error_without_json() {
        let err = interpret_response(500, b"<html>Internal Server Error</html>").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Server {
                status: 500,
                message: None
            }
        );
        assert_eq!(err.user_message(), "HTTP error! status: 500");
    }

    #[test]
    fn test_server_error_json_without_error_field() {
        let err = interpret_response(404, br#"{ "detail": "nope" }"#).unwrap_err();
        assert_eq!(err.user_message(), "HTTP error! status: 404");
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let err = interpret_response(200, br#"{ "prediction": "cat" }"#).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Malformed("missing confidence".to_string())
        );

        let err = interpret_response(200, br#"{ "confidence": 12 }"#).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Malformed("missing prediction".to_string())
        );
    }

    #[test]
    fn test_non_json_success_is_malformed() {
        assert!(matches!(
            interpret_response(200, b"ok"),
            Err(AnalysisError::Malformed(_))
        ));
    }
}
