use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub app_version: String,
    pub input_size: usize,
    pub num_classes: usize,

    pub model: ModelStatus,
    pub history: HistoryStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub engine: String, // "onnx" | "none"
    pub location: String,
    pub loaded: bool,
    pub sha256: Option<String>,
    pub loaded_at: Option<String>,
    pub inference_count: u64,
    pub avg_latency_ms: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryStatus {
    pub storage_key: String,
    pub total_results: usize,
    pub latest_timestamp: Option<String>,
    /// Why the history could not be read, if it could not
    pub error: Option<String>,
}
