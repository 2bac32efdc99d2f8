//! Analysis Pipeline - one strip photo in, one AnalysisResult out
//!
//! Flow: Preprocess -> (load model if absent) -> Infer -> Interpret -> (record)
//!
//! Every pipeline error is caught here and turned into the fallback result;
//! nothing partial ever leaves this module.

use std::sync::Arc;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::config::AnalysisConfig;
use crate::logic::history::{HistoryError, HistoryStore};
use crate::logic::interpret::{interpret, AnalysisResult};
use crate::logic::model::{run_inference, InferenceError, ModelLoadError, ModelLoader};
use crate::logic::preprocess::{preprocess, ImageDecodeError};

// ============================================================================
// STATE MACHINE
// ============================================================================

/// Stage of a single analysis invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStage {
    Idle,
    Preprocessing,
    ModelLoading,
    Inferring,
    Interpreting,
    Completed,
    Failed,
}

impl AnalysisStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStage::Completed | AnalysisStage::Failed)
    }
}

struct StageTracker {
    stage: AnalysisStage,
}

impl StageTracker {
    fn new() -> Self {
        Self { stage: AnalysisStage::Idle }
    }

    fn advance(&mut self, next: AnalysisStage) {
        log::debug!("Analysis stage: {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
    #[error(transparent)]
    ImageDecode(#[from] ImageDecodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Error plus the stage it happened in
#[derive(Debug, Error)]
#[error("Analysis failed during {stage:?}: {source}")]
pub struct StagedError {
    pub stage: AnalysisStage,
    #[source]
    pub source: AnalysisError,
}

/// Result of `analyze_and_record`
#[derive(Debug)]
pub struct RecordedAnalysis {
    pub result: AnalysisResult,
    /// True when the result was prepended to history
    pub recorded: bool,
    /// Set when the analysis completed but persisting it failed
    pub history_error: Option<HistoryError>,
}

// ============================================================================
// ANALYZER
// ============================================================================

/// Owns the model loader; shared by reference across analyses.
pub struct Analyzer {
    loader: ModelLoader,
    filter: FilterType,
}

impl Analyzer {
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            loader,
            filter: FilterType::Triangle,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        let loader = ModelLoader::from_path(&config.model_path)
            .with_expected_sha256(config.model_sha256.clone());
        Self::new(loader).with_filter(config.resize_filter.filter_type())
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }

    /// Run the pipeline, returning the typed error on failure
    pub async fn try_analyze(&self, image_bytes: Vec<u8>) -> Result<AnalysisResult, StagedError> {
        let mut tracker = StageTracker::new();

        match self.run(&mut tracker, image_bytes).await {
            Ok(result) => {
                tracker.advance(AnalysisStage::Completed);
                Ok(result)
            }
            Err(source) => {
                let stage = tracker.stage;
                tracker.advance(AnalysisStage::Failed);
                Err(StagedError { stage, source })
            }
        }
    }

    /// Run the pipeline; any failure yields the fallback result
    pub async fn analyze(&self, image_bytes: Vec<u8>) -> AnalysisResult {
        match self.try_analyze(image_bytes).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Error during model analysis: {}", e);
                AnalysisResult::fallback()
            }
        }
    }

    /// Analyze and prepend completed results to `history`.
    ///
    /// Failed analyses are never recorded.
    pub async fn analyze_and_record(&self, image_bytes: Vec<u8>, history: &HistoryStore) -> RecordedAnalysis {
        let result = match self.try_analyze(image_bytes).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Error during model analysis: {}", e);
                return RecordedAnalysis {
                    result: AnalysisResult::fallback(),
                    recorded: false,
                    history_error: None,
                };
            }
        };

        match history.record(result.clone()) {
            Ok(()) => RecordedAnalysis { result, recorded: true, history_error: None },
            Err(e) => {
                log::error!("Failed to save analysis result: {}", e);
                RecordedAnalysis { result, recorded: false, history_error: Some(e) }
            }
        }
    }

    async fn run(&self, tracker: &mut StageTracker, image_bytes: Vec<u8>) -> Result<AnalysisResult, AnalysisError> {
        tracker.advance(AnalysisStage::Preprocessing);
        let filter = self.filter;
        let tensor = tokio::task::spawn_blocking(move || preprocess(&image_bytes, filter))
            .await
            .map_err(|e| ImageDecodeError::Task(e.to_string()))??;

        if !self.loader.is_loaded() {
            tracker.advance(AnalysisStage::ModelLoading);
        }
        let model = self.loader.load().await?;

        tracker.advance(AnalysisStage::Inferring);
        let raw_output = run_inference(Arc::clone(&model), tensor).await?;

        tracker.advance(AnalysisStage::Interpreting);
        let result = interpret(&raw_output);

        log::info!(
            "Prediction results: confidence={:.3}, color={}, severity={}",
            result.confidence(),
            result.color_detected(),
            result.severity()
        );

        Ok(result)
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("loader", &self.loader)
            .field("filter", &self.filter)
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::interpret::{ColorIndicator, Severity};
    use crate::logic::testing::{loader_for, solid_png, FakeSource};

    fn analyzer(source: &Arc<FakeSource>) -> Analyzer {
        Analyzer::new(loader_for(source))
    }

    #[tokio::test]
    async fn test_completed_analysis() {
        let source = Arc::new(FakeSource::returning(vec![0.1, 0.7, 0.2]));
        let analyzer = analyzer(&source);

        let result = analyzer.analyze(solid_png(320, 240, [230, 140, 30])).await;

        assert!(!result.is_fallback());
        assert_eq!(result.severity(), Severity::HighRisk);
        assert_eq!(result.color_detected(), ColorIndicator::Orange);
        assert!((result.confidence() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_decode_failure_yields_sentinel() {
        let source = Arc::new(FakeSource::returning(vec![0.0, 0.0, 1.0]));
        let analyzer = analyzer(&source);

        let result = analyzer.analyze(b"\x00\x01 not an image".to_vec()).await;

        assert_eq!(result.confidence(), 0.0);
        assert_eq!(result.severity(), Severity::Normal);
        assert_eq!(result.color_detected(), ColorIndicator::Yellow);
        assert!(result.is_fallback());
        // Preprocessing runs first, so the model is never fetched
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn test_failure_reports_stage() {
        let source = Arc::new(FakeSource::returning(vec![1.0, 0.0, 0.0]));
        let analyzer = analyzer(&source);

        let err = analyzer.try_analyze(b"garbage".to_vec()).await.unwrap_err();
        assert_eq!(err.stage, AnalysisStage::Preprocessing);
        assert!(matches!(err.source, AnalysisError::ImageDecode(_)));
    }

    #[tokio::test]
    async fn test_model_load_failure_yields_sentinel() {
        let source = Arc::new(FakeSource {
            failures_before_success: 1,
            ..FakeSource::returning(vec![0.0, 1.0, 0.0])
        });
        let analyzer = analyzer(&source);
        let png = solid_png(64, 64, [250, 220, 60]);

        let err = analyzer.try_analyze(png.clone()).await.unwrap_err();
        assert_eq!(err.stage, AnalysisStage::ModelLoading);
        assert!(matches!(err.source, AnalysisError::ModelLoad(_)));

        // No automatic retry; an explicit re-invocation loads the model
        let result = analyzer.analyze(png).await;
        assert_eq!(result.severity(), Severity::HighRisk);
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_inference_failure_yields_sentinel() {
        let source = Arc::new(FakeSource::failing_inference());
        let analyzer = analyzer(&source);

        let err = analyzer.try_analyze(solid_png(50, 50, [1, 2, 3])).await.unwrap_err();
        assert_eq!(err.stage, AnalysisStage::Inferring);

        let result = analyzer.analyze(solid_png(50, 50, [1, 2, 3])).await;
        assert!(result.is_fallback());
    }

    #[tokio::test]
    async fn test_non_finite_output_yields_sentinel() {
        let source = Arc::new(FakeSource::returning(vec![f32::NAN, 0.2, 0.3]));
        let analyzer = analyzer(&source);
        let png = solid_png(50, 50, [240, 230, 90]);

        let err = analyzer.try_analyze(png.clone()).await.unwrap_err();
        assert_eq!(err.stage, AnalysisStage::Inferring);
        assert!(matches!(err.source, AnalysisError::Inference(_)));

        let result = analyzer.analyze(png.clone()).await;
        assert!(result.is_fallback());
        assert_eq!(result.confidence(), 0.0);

        // Nothing reaches the history, which stays readable
        let history = HistoryStore::in_memory("test_history");
        let recorded = analyzer.analyze_and_record(png, &history).await;
        assert!(!recorded.recorded);
        assert!(recorded.history_error.is_none());
        assert!(history.list().unwrap().is_empty());
    }

    #[test]
    fn test_decode_task_failure_is_a_preprocessing_error() {
        let err: AnalysisError = ImageDecodeError::Task("task panicked".to_string()).into();
        assert!(matches!(err, AnalysisError::ImageDecode(ImageDecodeError::Task(_))));
        assert!(err.to_string().contains("task panicked"));
    }

    #[tokio::test]
    async fn test_model_loaded_once_across_analyses() {
        let source = Arc::new(FakeSource::returning(vec![0.6, 0.3, 0.1]));
        let analyzer = analyzer(&source);

        for _ in 0..3 {
            analyzer.analyze(solid_png(40, 40, [240, 230, 90])).await;
        }

        assert_eq!(source.fetches(), 1);
        let model = analyzer.loader().get().unwrap();
        assert_eq!(model.stats().inference_count(), 3);
    }

    #[tokio::test]
    async fn test_analyze_and_record() {
        let source = Arc::new(FakeSource::returning(vec![0.1, 0.1, 0.8]));
        let analyzer = analyzer(&source);
        let history = HistoryStore::in_memory("test_history");

        let ok = analyzer.analyze_and_record(solid_png(30, 30, [90, 200, 90]), &history).await;
        assert!(ok.recorded);
        assert!(ok.history_error.is_none());

        let failed = analyzer.analyze_and_record(b"nope".to_vec(), &history).await;
        assert!(!failed.recorded);
        assert!(failed.result.is_fallback());

        let stored = history.list().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], ok.result);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(AnalysisStage::Completed.is_terminal());
        assert!(AnalysisStage::Failed.is_terminal());
        assert!(!AnalysisStage::Inferring.is_terminal());
    }
}
