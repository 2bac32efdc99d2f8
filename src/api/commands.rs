//! Commands - API cho Frontend
//!
//! Strip analysis, history and engine status. Errors cross this boundary as
//! plain strings.

use serde::{Deserialize, Serialize};

use crate::constants::{APP_VERSION, INPUT_SIZE, NUM_CLASSES};
use crate::logic::analysis::Analyzer;
use crate::logic::config::AnalysisConfig;
use crate::logic::history::{HistoryEntry, HistoryStore};
use crate::logic::interpret::AnalysisResult;
use crate::logic::model::ModelMetadata;
use super::engine_status::{EngineStatus, HistoryStatus, ModelStatus};

// ============================================================================
// STATE
// ============================================================================

/// Everything the commands operate on
#[derive(Debug)]
pub struct AppState {
    pub analyzer: Analyzer,
    pub history: HistoryStore,
}

impl AppState {
    pub fn new(analyzer: Analyzer, history: HistoryStore) -> Self {
        Self { analyzer, history }
    }

    /// File-backed state from configuration
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            analyzer: Analyzer::from_config(config),
            history: HistoryStore::on_disk(&config.data_dir, config.history_key.clone()),
        }
    }
}

/// Outcome of `analyze_image`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub result: AnalysisResult,
    /// Fallback result: show "please retry" instead of a clinical result
    pub needs_retry: bool,
    pub saved: bool,
    /// Set when the analysis completed but the history write failed
    pub save_error: Option<String>,
}

// ============================================================================
// ANALYSIS COMMANDS
// ============================================================================

/// Phân tích ảnh que thử; `save` ghi kết quả thành công vào lịch sử
pub async fn analyze_image(state: &AppState, image_bytes: Vec<u8>, save: bool) -> Result<ScanOutcome, String> {
    if !save {
        let result = state.analyzer.analyze(image_bytes).await;
        let needs_retry = result.is_fallback();
        return Ok(ScanOutcome { result, needs_retry, saved: false, save_error: None });
    }

    // A failed write must not cost the caller the result it already has.
    let recorded = state.analyzer.analyze_and_record(image_bytes, &state.history).await;
    let needs_retry = recorded.result.is_fallback();
    Ok(ScanOutcome {
        result: recorded.result,
        needs_retry,
        saved: recorded.recorded,
        save_error: recorded.history_error.map(|e| e.to_string()),
    })
}

/// Lưu một kết quả vào lịch sử
pub async fn save_analysis_result(state: &AppState, result: AnalysisResult) -> Result<bool, String> {
    state.history.record(result).map_err(|e| e.to_string())?;
    Ok(true)
}

// ============================================================================
// HISTORY COMMANDS
// ============================================================================

/// Lấy lịch sử phân tích (mới nhất trước)
pub async fn get_analysis_history(state: &AppState, limit: Option<usize>) -> Result<Vec<HistoryEntry>, String> {
    let entries = state.history.entries().map_err(|e| e.to_string())?;

    Ok(match limit {
        Some(limit) => entries.into_iter().take(limit).collect(),
        None => entries,
    })
}

/// Xóa toàn bộ lịch sử (guest teardown / logout)
pub async fn clear_analysis_history(state: &AppState) -> Result<bool, String> {
    state.history.clear().map_err(|e| e.to_string())?;
    Ok(true)
}

// ============================================================================
// MODEL COMMANDS
// ============================================================================

/// Load model (no-op if already cached)
pub async fn load_model(state: &AppState) -> Result<ModelMetadata, String> {
    let model = state.analyzer.loader().load().await.map_err(|e| e.to_string())?;
    Ok(model.metadata().clone())
}

/// Xác minh checksum của model
pub async fn verify_model_checksum(state: &AppState, expected_sha256: String) -> Result<bool, String> {
    let model = state.analyzer.loader().load().await.map_err(|e| e.to_string())?;
    Ok(model.verify_checksum(&expected_sha256))
}

// ============================================================================
// STATUS
// ============================================================================

pub async fn get_engine_status(state: &AppState) -> Result<EngineStatus, String> {
    let loader = state.analyzer.loader();

    let model = match loader.get() {
        Some(model) => {
            let stats = model.stats().snapshot();
            let metadata = model.metadata();
            ModelStatus {
                engine: metadata.engine.clone(),
                location: metadata.location.clone(),
                loaded: true,
                sha256: Some(metadata.sha256.clone()),
                loaded_at: Some(metadata.loaded_at.to_rfc3339()),
                inference_count: stats.inference_count,
                avg_latency_ms: stats.avg_latency_ms,
            }
        }
        None => ModelStatus {
            engine: "none".to_string(),
            location: loader.location(),
            loaded: false,
            sha256: None,
            loaded_at: None,
            inference_count: 0,
            avg_latency_ms: 0.0,
        },
    };

    let storage_key = state.history.key().to_string();
    let history = match state.history.list() {
        Ok(results) => HistoryStatus {
            storage_key,
            total_results: results.len(),
            latest_timestamp: results.first().map(|r| r.timestamp().to_string()),
            error: None,
        },
        Err(e) => {
            log::warn!("History unreadable, reporting status without it: {}", e);
            HistoryStatus {
                storage_key,
                total_results: 0,
                latest_timestamp: None,
                error: Some(e.to_string()),
            }
        }
    };

    Ok(EngineStatus {
        app_version: APP_VERSION.to_string(),
        input_size: INPUT_SIZE,
        num_classes: NUM_CLASSES,
        model,
        history,
    })
}

// ============================================================================
// UNIT TESTS
// ============================================================================
