//! The analysis verdict and how it is graded for display.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Confidence strictly above this is [`Severity::High`].
pub const HIGH_SEVERITY_THRESHOLD: f64 = 0.75;
/// Confidence at or above this (and not high) is [`Severity::Medium`].
pub const MEDIUM_SEVERITY_THRESHOLD: f64 = 0.40;

/// The model's structured verdict on a set of frames.
///
/// Field names match the JSON the model is asked to produce. All four
/// fields are required; unknown extra fields are ignored.
///
/// # Example
///
/// ```
/// use vidverdict::{AnalysisResult, Severity};
///
/// let result = AnalysisResult::from_json(
///     r#"{"is_ai_generated": true, "confidence_score": 0.92,
///         "reasoning": "Hands morph between frames.",
///         "artifacts_detected": ["six-fingered hand"]}"#,
/// )?;
/// assert_eq!(result.severity(), Severity::High);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// `true` if the video is likely AI-generated.
    pub is_ai_generated: bool,
    /// Confidence in the verdict, in `[0.0, 1.0]`.
    pub confidence_score: f64,
    /// Free-text explanation citing visual evidence.
    pub reasoning: String,
    /// Short labels for each inconsistency observed. May be empty.
    pub artifacts_detected: Vec<String>,
}

impl AnalysisResult {
    /// Parse a model response body.
    ///
    /// # Errors
    ///
    /// Fails on non-JSON input, a missing field, or a field of the wrong
    /// type (e.g. a string `confidence_score`).
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body.trim())
    }

    pub fn severity(&self) -> Severity {
        Severity::from_confidence(self.confidence_score)
    }

    /// Headline for the verdict.
    pub fn title(&self) -> &'static str {
        if self.is_ai_generated {
            "AI-Generated Content Detected"
        } else {
            "Likely Authentic Content"
        }
    }

    /// Confidence as a percentage with one decimal, e.g. `"92.0%"`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.confidence_score * 100.0)
    }
}

/// Display bucket for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Below 0.40. Rendered green.
    Low,
    /// 0.40 up to and including 0.75. Rendered yellow.
    Medium,
    /// Above 0.75. Rendered red.
    High,
}

impl Severity {
    pub fn from_confidence(score: f64) -> Self {
        if score > HIGH_SEVERITY_THRESHOLD {
            Severity::High
        } else if score >= MEDIUM_SEVERITY_THRESHOLD {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Indicator color name.
    pub fn color_name(self) -> &'static str {
        match self {
            Severity::Low => "green",
            Severity::Medium => "yellow",
            Severity::High => "red",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(label)
    }
}
