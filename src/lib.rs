//! CareNest Core - on-device urine test strip analysis
//!
//! Decode a strip photo, run the kidney-risk classifier once, interpret the
//! output into a structured result and keep a newest-first history.

pub mod api;
pub mod constants;
pub mod logic;

pub use logic::analysis::{AnalysisError, AnalysisStage, Analyzer, RecordedAnalysis, StagedError};
pub use logic::config::{AnalysisConfig, ResizeFilter};
pub use logic::history::{HistoryEntry, HistoryError, HistoryStore};
pub use logic::interpret::{interpret, AnalysisResult, ColorIndicator, Severity};
pub use logic::model::{ModelLoadError, ModelLoader};
pub use logic::preprocess::{preprocess, ImageDecodeError, InputTensor};
