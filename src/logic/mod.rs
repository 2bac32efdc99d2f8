//! Logic Module - Business Logic & Engines
//!
//! Chứa các engine của pipeline phân tích que thử nước tiểu.
//!
//! ## Architecture
//! - `preprocess` - Image bytes -> normalized `[1, 224, 224, 3]` tensor
//! - `model/` - Model loading (single-flight cache) and ONNX inference
//! - `interpret/` - Arg-max over the output, fixed class profiles
//! - `history/` - Persisted results, newest first
//! - `analysis` - Orchestration state machine and fallback policy

pub mod config;
pub mod preprocess;
pub mod model;
pub mod interpret;
pub mod history;
pub mod analysis;

#[cfg(test)]
pub(crate) mod testing;
