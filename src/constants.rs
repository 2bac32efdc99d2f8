//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change where the model or the history lives, only edit this file.

/// Default model artifact location (ONNX export of the strip classifier)
pub const DEFAULT_MODEL_PATH: &str = "model/model.onnx";

/// Storage key under which the analysis history is persisted
pub const HISTORY_STORAGE_KEY: &str = "carenest_analysis_history";

/// Data directory name (under the platform local data dir)
pub const DATA_DIR_NAME: &str = "carenest";

/// Model input edge length (pixels)
pub const INPUT_SIZE: usize = 224;

/// Model input channels (RGB)
pub const INPUT_CHANNELS: usize = 3;

/// Number of classes the classifier emits
pub const NUM_CLASSES: usize = 3;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "CareNest";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get model artifact path from environment or use default
pub fn get_model_path() -> String {
    std::env::var("CARENEST_MODEL_PATH")
        .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
}

/// Get expected model checksum (hex SHA-256) from environment, if pinned
pub fn get_model_sha256() -> Option<String> {
    std::env::var("CARENEST_MODEL_SHA256")
        .ok()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

/// Get history storage key from environment or use default
pub fn get_history_key() -> String {
    std::env::var("CARENEST_HISTORY_KEY")
        .unwrap_or_else(|_| HISTORY_STORAGE_KEY.to_string())
}

/// Get data directory from environment or use the platform default
pub fn get_data_dir() -> std::path::PathBuf {
    std::env::var("CARENEST_DATA_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| std::path::PathBuf::from("."))
                .join(DATA_DIR_NAME)
        })
}
