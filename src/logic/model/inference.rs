//! Inference Engine - ONNX Runtime Integration
//!
//! Chạy một forward pass trên tensor đã preprocess.
//! Runtime sits behind the `Classifier` trait so the pipeline can swap it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;

use crate::logic::preprocess::InputTensor;
use super::loader::LoadedModel;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
#[error("InferenceError: {0}")]
pub struct InferenceError(pub String);

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait cho classifier runtimes (ONNX, test doubles, ...)
///
/// `predict` takes the tensor by value: input and output buffers are
/// released when the call returns, on success and on error.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: InputTensor) -> Result<Vec<f32>, InferenceError>;
    fn name(&self) -> &str;
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// ONNX Runtime classifier
pub struct OnnxClassifier {
    // `Session::run` needs `&mut`; the lock serializes forward passes.
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxClassifier {
    /// Build a session from serialized model bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, InferenceError> {
        log::info!("Building ONNX session from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| InferenceError(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| InferenceError(format!("Load from memory error: {}", e)))?;

        let output_name = session.outputs.first()
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError("No output defined".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: InputTensor) -> Result<Vec<f32>, InferenceError> {
        let mut session = self.session.lock();

        let input_tensor = Value::from_array(input)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let output = outputs.get(&self.output_name)
            .ok_or_else(|| InferenceError("No output".to_string()))?;

        let output_tensor = output.try_extract_tensor::<f32>()
            .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;

        Ok(output_tensor.1.to_vec())
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

// ============================================================================
// STATS
// ============================================================================

/// Latency stats for one loaded model
#[derive(Debug, Default)]
pub struct InferenceStats {
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl InferenceStats {
    fn track(&self, elapsed_us: u64) {
        self.latency_sum_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inference_count(&self) -> u64 {
        self.inference_count.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f32 {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count();
        if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inference_count: self.inference_count(),
            avg_latency_ms: self.avg_latency_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub inference_count: u64,
    pub avg_latency_ms: f32,
}

// ============================================================================
// RUNNER
// ============================================================================

/// Run one forward pass off the async executor.
///
/// The tensor moves into the blocking task and is dropped there together
/// with the runtime's output handle, whichever way the pass ends.
pub async fn run_inference(model: Arc<LoadedModel>, tensor: InputTensor) -> Result<Vec<f32>, InferenceError> {
    tokio::task::spawn_blocking(move || {
        let start_time = std::time::Instant::now();
        let output = model.classifier().predict(tensor)?;
        model.stats().track(start_time.elapsed().as_micros() as u64);

        check_finite(&output)?;
        Ok(output)
    })
    .await
    .map_err(|e| InferenceError(format!("Task failed: {}", e)))?
}

/// NaN / inf outputs cannot be interpreted or persisted as JSON
fn check_finite(output: &[f32]) -> Result<(), InferenceError> {
    match output.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(InferenceError(format!(
            "Non-finite model output at index {}: {}",
            index, output[index]
        ))),
        None => Ok(()),
    }
}
