// SPDX-License-Identifier: GPL-3.0-only

//! Text shown in the result and error regions

use super::state::Mode;
use crate::backends::analysis::AnalysisResult;

/// Result label shown when analysis fails
pub const ANALYSIS_FAILED_LABEL: &str = "Analysis Failed";

/// Text content of the result/error regions for the current mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Display {
    pub result_text: Option<String>,
    pub confidence_text: Option<String>,
    pub error_text: Option<String>,
}

impl Display {
    pub fn build(mode: Mode, result: Option<&AnalysisResult>, error: Option<&str>) -> Self {
        match (mode, result, error) {
            (Mode::ResultShown, Some(result), _) => Self {
                result_text: Some(format_prediction(&result.prediction)),
                confidence_text: Some(format_confidence(result.confidence)),
                error_text: None,
            },
            (Mode::ErrorShown, _, error) => Self {
                result_text: Some(ANALYSIS_FAILED_LABEL.to_string()),
                confidence_text: Some(String::new()),
                error_text: Some(format_error(error.unwrap_or_default())),
            },
            _ => Self::default(),
        }
    }

    /// Non-empty lines, top to bottom
    pub fn lines(&self) -> Vec<&str> {
        [&self.result_text, &self.confidence_text, &self.error_text]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

pub fn format_prediction(prediction: &str) -> String {
    format!("Prediction: {}", prediction)
}

pub fn format_confidence(confidence: f64) -> String {
    format!("Confidence: {:.2}%", confidence)
}

pub fn format_error(message: &str) -> String {
    format!("Error: {}", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_text() {
        let result = AnalysisResult {
            prediction: "cat".to_string(),
            confidence: 87.5,
        };
        let display = Display::build(Mode::ResultShown, Some(&result), None);
        assert_eq!(display.result_text.as_deref(), Some("Prediction: cat"));
        assert_eq!(display.confidence_text.as_deref(), Some("Confidence: 87.50%"));
        assert_eq!(display.error_text, None);
    }

    #[test]
    fn test_error_text_suppresses_confidence() {
        let display = Display::build(Mode::ErrorShown, None, Some("model unavailable"));
        assert_eq!(display.result_text.as_deref(), Some("Analysis Failed"));
        assert_eq!(display.confidence_text.as_deref(), Some(""));
        assert_eq!(display.error_text.as_deref(), Some("Error: model unavailable"));
        assert_eq!(
            display.lines(),
            vec!["Analysis Failed", "Error: model unavailable"]
        );
    }

    #[test]
    fn test_other_modes_show_nothing() {
        for mode in [Mode::Idle, Mode::CameraActive, Mode::PreviewReady, Mode::Analyzing] {
            assert_eq!(Display::build(mode, None, Some("stale")), Display::default());
        }
    }

    #[test]
    fn test_confidence_rounding() {
        assert_eq!(format_confidence(99.999), "Confidence: 100.00%");
        assert_eq!(format_confidence(0.0), "Confidence: 0.00%");
    }
}
