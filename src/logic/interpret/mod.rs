//! Interpret Module - Model output to clinical result
//!
//! Chọn class có xác suất cao nhất (arg-max) và tra bảng class profile.
//! Pure apart from the timestamp; no I/O.
//!
//! ## Structure
//! - `types`: AnalysisResult, Severity, ColorIndicator
//! - `classes`: Fixed per-class clinical profiles

pub mod types;
pub mod classes;


pub use types::{AnalysisResult, ColorIndicator, Severity};
pub use classes::{profile_for_index, ClassProfile};

/// Index and value of the maximum entry.
///
/// Left-to-right scan with strict `>`, so the first maximal entry wins.
/// Returns `None` for an empty vector.
pub fn arg_max(values: &[f32]) -> Option<(usize, f32)> {
    let (&first, rest) = values.split_first()?;

    let mut max_index = 0;
    let mut max_value = first;

    for (i, &value) in rest.iter().enumerate() {
        if value > max_value {
            max_value = value;
            max_index = i + 1;
        }
    }

    Some((max_index, max_value))
}

/// Map a raw output vector to an AnalysisResult.
///
/// An index outside the class table, or an empty vector, falls back to the
/// normal row. Confidence is the raw maximum (0.0 for an empty vector).
pub fn interpret(raw_output: &[f32]) -> AnalysisResult {
    let (max_index, confidence) = arg_max(raw_output).unwrap_or((0, 0.0));
    let profile = profile_for_index(max_index);

    AnalysisResult::from_profile(profile, confidence)
}
