//! Model Module - AI/ML Inference Engine
//!
//! Tách việc load model khỏi việc chạy inference.
//! Dễ dàng swap runtime qua `Classifier` / `ModelSource`.

pub mod inference;
pub mod loader;

#[cfg(test)]
mod tests;

// Re-export common types
pub use inference::{run_inference, Classifier, InferenceError, InferenceStats, OnnxClassifier, StatsSnapshot};
pub use loader::{artifact_checksum, LoadedModel, ModelLoadError, ModelLoader, ModelMetadata, ModelSource, OnnxFileSource};
