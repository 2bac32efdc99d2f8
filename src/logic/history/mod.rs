//! History Module - Persisted analysis results
//!
//! Lưu kết quả phân tích, mới nhất đứng đầu.
//! Unbounded: no capping, dedup or eviction.
//!
//! ## Layout
//! One JSON array of AnalysisResult under a single storage key.

pub mod storage;


use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logic::interpret::AnalysisResult;
pub use storage::{FileStorage, HistoryError, MemoryStorage, StorageBackend};

/// Numbered history row, as listed on the history screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// "Test #N", oldest test is #1
    pub number: usize,
    pub result: AnalysisResult,
}

/// Append-only (prepend) store of analysis results
pub struct HistoryStore {
    backend: Box<dyn StorageBackend>,
    key: String,
    // Serializes the read-prepend-write cycle of `record`.
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(backend: Box<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Session-scoped store
    pub fn in_memory(key: impl Into<String>) -> Self {
        Self::new(Box::new(MemoryStorage::new()), key)
    }

    /// File-backed store under `dir`
    pub fn on_disk(dir: &Path, key: impl Into<String>) -> Self {
        Self::new(Box::new(FileStorage::new(dir)), key)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Prepend a result; the store owns it from here on
    pub fn record(&self, result: AnalysisResult) -> Result<(), HistoryError> {
        // JSON has no NaN/inf; one such entry would make the document unreadable.
        if !result.confidence().is_finite() {
            return Err(HistoryError::NonFiniteConfidence(result.confidence()));
        }

        let _guard = self.write_lock.lock();

        let mut results = self.read_all()?;
        results.insert(0, result);

        let json = serde_json::to_string(&results)?;
        self.backend.set_item(&self.key, &json)?;

        log::debug!("Recorded analysis result ({} in history)", results.len());
        Ok(())
    }

    /// Full history, newest first; empty if nothing was stored yet
    pub fn list(&self) -> Result<Vec<AnalysisResult>, HistoryError> {
        self.read_all()
    }

    /// Numbered view, newest first
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let results = self.read_all()?;
        let total = results.len();

        Ok(results
            .into_iter()
            .enumerate()
            .map(|(index, result)| HistoryEntry { number: total - index, result })
            .collect())
    }

    pub fn len(&self) -> Result<usize, HistoryError> {
        Ok(self.read_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, HistoryError> {
        Ok(self.len()? == 0)
    }

    /// Drop the whole collection (session teardown / logout)
    pub fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock();
        self.backend.remove_item(&self.key)?;
        log::info!("Analysis history cleared");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<AnalysisResult>, HistoryError> {
        match self.backend.get_item(&self.key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore").field("key", &self.key).finish()
    }
}
