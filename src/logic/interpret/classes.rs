//! Class Profiles
//!
//! Fixed clinical bundle per model class. Index order is the model's output
//! order: 0 = normal/yellow, 1 = high-risk/orange, 2 = danger/green.

use super::types::Severity;

/// Display and clinical fields tied to one class
#[derive(Debug)]
pub struct ClassProfile {
    pub severity: Severity,
    pub ratio: &'static str,
    pub diagnosis: &'static str,
    pub recommendations: &'static [&'static str],
}

static NORMAL: ClassProfile = ClassProfile {
    severity: Severity::Normal,
    ratio: "Normal (< 30 mg/g)",
    diagnosis: "Normal kidney function detected. Your albumin-creatinine ratio appears to be within healthy limits.",
    recommendations: &[
        "Continue maintaining a healthy lifestyle",
        "Stay hydrated with 8-10 glasses of water daily",
        "Maintain a balanced diet low in sodium",
        "Schedule regular check-ups with your healthcare provider",
        "Keep monitoring your kidney health annually",
    ],
};

static HIGH_RISK: ClassProfile = ClassProfile {
    severity: Severity::HighRisk,
    ratio: "Elevated (30-300 mg/g)",
    diagnosis: "Elevated albumin-creatinine ratio detected. This indicates potential kidney stress or early-stage kidney disease.",
    recommendations: &[
        "Consult with a nephrologist within 2-4 weeks",
        "Monitor blood pressure regularly",
        "Follow a kidney-friendly diet (low sodium, moderate protein)",
        "Increase water intake and maintain hydration",
        "Avoid NSAIDs and nephrotoxic medications",
        "Schedule follow-up tests in 3-6 months",
    ],
};

static DANGER: ClassProfile = ClassProfile {
    severity: Severity::Danger,
    ratio: "Critical (> 300 mg/g)",
    diagnosis: "Critical albumin-creatinine ratio detected. This indicates significant kidney damage requiring immediate medical attention.",
    recommendations: &[
        "URGENT: Contact a nephrologist immediately",
        "Schedule comprehensive kidney function tests",
        "Monitor blood pressure and blood sugar closely",
        "Follow strict dietary restrictions as advised by doctor",
        "Consider medication adjustment with healthcare provider",
        "Prepare for possible dialysis or transplant evaluation",
    ],
};

impl Severity {
    /// Fixed profile for this class
    pub fn profile(&self) -> &'static ClassProfile {
        match self {
            Severity::Normal => &NORMAL,
            Severity::HighRisk => &HIGH_RISK,
            Severity::Danger => &DANGER,
        }
    }
}

/// Profile for a class index; unknown indices degrade to the normal row
pub fn profile_for_index(index: usize) -> &'static ClassProfile {
    Severity::from_index(index)
        .unwrap_or(Severity::Normal)
        .profile()
}
