//! Model Loader - load once, share everywhere
//!
//! Fetches the artifact, verifies its checksum and builds the classifier.
//! The first successful load is cached for the lifetime of the loader; a
//! failed load leaves the cache empty so the next call retries.
//! Concurrent first callers share one in-flight load.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::OnceCell;

use super::inference::{Classifier, InferenceStats, OnnxClassifier};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, Error)]
#[error("Failed to load classification model from '{location}': {reason}")]
pub struct ModelLoadError {
    pub location: String,
    pub reason: String,
}

impl ModelLoadError {
    pub fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// MODEL SOURCE
// ============================================================================

/// Where an artifact comes from and how it becomes a classifier
pub trait ModelSource: Send + Sync {
    /// Human-readable artifact location (used in errors and status)
    fn location(&self) -> String;

    /// Fetch raw artifact bytes
    fn fetch(&self) -> Result<Vec<u8>, ModelLoadError>;

    /// Deserialize artifact bytes into a ready classifier
    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn Classifier>, ModelLoadError>;
}

/// ONNX artifact on the local filesystem
#[derive(Debug, Clone)]
pub struct OnnxFileSource {
    path: PathBuf,
}

impl OnnxFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelSource for OnnxFileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<u8>, ModelLoadError> {
        if !self.path.exists() {
            return Err(ModelLoadError::new(self.location(), "Model not found"));
        }

        std::fs::read(&self.path)
            .map_err(|e| ModelLoadError::new(self.location(), format!("Read error: {}", e)))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn Classifier>, ModelLoadError> {
        let classifier = OnnxClassifier::from_bytes(bytes)
            .map_err(|e| ModelLoadError::new(self.location(), e.0))?;
        Ok(Box::new(classifier))
    }
}

// ============================================================================
// LOADED MODEL
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub location: String,
    pub engine: String,
    pub sha256: String,
    pub size_bytes: usize,
    pub loaded_at: DateTime<Utc>,
}

/// A ready classifier plus its metadata and stats. Read-only after load.
pub struct LoadedModel {
    classifier: Box<dyn Classifier>,
    metadata: ModelMetadata,
    stats: InferenceStats,
}

impl LoadedModel {
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn stats(&self) -> &InferenceStats {
        &self.stats
    }

    /// Compare the artifact checksum against an expected hex digest
    pub fn verify_checksum(&self, expected_sha256: &str) -> bool {
        self.metadata.sha256.eq_ignore_ascii_case(expected_sha256.trim())
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("engine", &self.classifier.name())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Hex SHA-256 of an artifact
pub fn artifact_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn build_model(source: &dyn ModelSource, expected_sha256: Option<&str>) -> Result<LoadedModel, ModelLoadError> {
    let location = source.location();
    log::info!("Loading classification model from: {}", location);

    let bytes = source.fetch()?;
    let sha256 = artifact_checksum(&bytes);

    if let Some(expected) = expected_sha256 {
        if !sha256.eq_ignore_ascii_case(expected.trim()) {
            return Err(ModelLoadError::new(
                location,
                format!("Checksum mismatch: expected {}, got {}", expected, sha256),
            ));
        }
    }

    let classifier = source.deserialize(&bytes)?;

    let metadata = ModelMetadata {
        location,
        engine: classifier.name().to_string(),
        sha256,
        size_bytes: bytes.len(),
        loaded_at: Utc::now(),
    };

    log::info!("Model loaded successfully ({}, sha256 {})", metadata.engine, metadata.sha256);

    Ok(LoadedModel {
        classifier,
        metadata,
        stats: InferenceStats::default(),
    })
}

// ============================================================================
// LOADER
// ============================================================================

/// Lazily loads and caches a single model instance.
pub struct ModelLoader {
    source: Arc<dyn ModelSource>,
    expected_sha256: Option<String>,
    cell: OnceCell<Arc<LoadedModel>>,
    fetch_count: AtomicU64,
}

impl ModelLoader {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self {
            source,
            expected_sha256: None,
            cell: OnceCell::new(),
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Loader for an ONNX artifact on disk
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(OnnxFileSource::new(path)))
    }

    /// Pin the artifact checksum; a mismatching artifact fails to load
    pub fn with_expected_sha256(mut self, sha256: Option<String>) -> Self {
        self.expected_sha256 = sha256;
        self
    }

    pub fn location(&self) -> String {
        self.source.location()
    }

    /// Return the cached model, loading it on first use.
    pub async fn load(&self) -> Result<Arc<LoadedModel>, ModelLoadError> {
        let model = self.cell.get_or_try_init(|| self.fetch_and_build()).await?;
        Ok(Arc::clone(model))
    }

    async fn fetch_and_build(&self) -> Result<Arc<LoadedModel>, ModelLoadError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let source = Arc::clone(&self.source);
        let expected = self.expected_sha256.clone();

        let model = tokio::task::spawn_blocking(move || build_model(&*source, expected.as_deref()))
            .await
            .map_err(|e| ModelLoadError::new(self.location(), format!("Load task failed: {}", e)))?
            .map_err(|e| {
                log::error!("Error loading model: {}", e);
                e
            })?;

        Ok(Arc::new(model))
    }

    /// Cached model, if a load has succeeded
    pub fn get(&self) -> Option<Arc<LoadedModel>> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of artifact fetches attempted so far
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLoader")
            .field("location", &self.source.location())
            .field("loaded", &self.is_loaded())
            .field("fetch_count", &self.fetch_count())
            .finish()
    }
}
