//! Analysis Result Types
//!
//! The structured result produced by one analysis, plus its closed enums.
//! No logic here beyond construction and accessors.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::classes::ClassProfile;

// ============================================================================
// ENUMS
// ============================================================================

/// Clinical risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Normal,
    HighRisk,
    Danger,
}

impl Severity {
    /// Class order as emitted by the model
    pub const ALL: [Severity; 3] = [Severity::Normal, Severity::HighRisk, Severity::Danger];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        match self {
            Severity::Normal => 0,
            Severity::HighRisk => 1,
            Severity::Danger => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::HighRisk => "high-risk",
            Severity::Danger => "danger",
        }
    }

    /// Strip color that indicates this severity
    pub fn color(&self) -> ColorIndicator {
        match self {
            Severity::Normal => ColorIndicator::Yellow,
            Severity::HighRisk => ColorIndicator::Orange,
            Severity::Danger => ColorIndicator::Green,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color detected on the test strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorIndicator {
    Yellow,
    Orange,
    Green,
}

impl ColorIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorIndicator::Yellow => "yellow",
            ColorIndicator::Orange => "orange",
            ColorIndicator::Green => "green",
        }
    }
}

impl std::fmt::Display for ColorIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ANALYSIS RESULT
// ============================================================================

/// Diagnosis text of the failure sentinel
pub const FALLBACK_DIAGNOSIS: &str =
    "Model analysis failed. Please ensure the model file is available and try again.";

/// Ratio band of the failure sentinel
pub const FALLBACK_RATIO: &str = "Unable to determine";

const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Check that the model file is present at the configured location",
    "Retake or re-upload the strip photo and try again",
    "Contact support if the issue persists",
];

/// One completed (or failed) analysis.
///
/// Fields are private: a result is immutable once created, and severity,
/// color and ratio only ever come from the same class profile.
/// Serialized field names match the persisted history layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    confidence: f32,
    diagnosis: String,
    recommendations: Vec<String>,
    severity: Severity,
    timestamp: String,
    color_detected: ColorIndicator,
    albumin_creatinine_ratio: String,
}

impl AnalysisResult {
    /// Build a result from a class profile, stamped with the current time
    pub(crate) fn from_profile(profile: &ClassProfile, confidence: f32) -> Self {
        Self {
            confidence,
            diagnosis: profile.diagnosis.to_string(),
            recommendations: profile.recommendations.iter().map(|r| r.to_string()).collect(),
            severity: profile.severity,
            timestamp: now_iso8601(),
            color_detected: profile.severity.color(),
            albumin_creatinine_ratio: profile.ratio.to_string(),
        }
    }

    /// Terminal result for a failed analysis (`confidence == 0.0`)
    pub fn fallback() -> Self {
        Self {
            confidence: 0.0,
            diagnosis: FALLBACK_DIAGNOSIS.to_string(),
            recommendations: FALLBACK_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
            severity: Severity::Normal,
            timestamp: now_iso8601(),
            color_detected: ColorIndicator::Yellow,
            albumin_creatinine_ratio: FALLBACK_RATIO.to_string(),
        }
    }

    /// True for the failure sentinel; callers should treat it as "please retry"
    pub fn is_fallback(&self) -> bool {
        self.confidence == 0.0 && self.diagnosis == FALLBACK_DIAGNOSIS
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Confidence as a whole percentage, as shown in the history list
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round().max(0.0) as u32
    }

    pub fn diagnosis(&self) -> &str {
        &self.diagnosis
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn color_detected(&self) -> ColorIndicator {
        self.color_detected
    }

    pub fn albumin_creatinine_ratio(&self) -> &str {
        &self.albumin_creatinine_ratio
    }

    /// ISO-8601 creation time (UTC, millisecond precision)
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
