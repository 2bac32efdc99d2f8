//! Runtime Configuration
//!
//! Paths, storage key and resampling filter for the analysis pipeline.
//! Defaults come from the environment (see `constants.rs`), CLI flags override.

use std::path::PathBuf;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Resampling filter used when resizing to the model input size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Some(ResizeFilter::Nearest),
            "triangle" | "bilinear" => Some(ResizeFilter::Triangle),
            "catmullrom" | "bicubic" => Some(ResizeFilter::CatmullRom),
            "gaussian" => Some(ResizeFilter::Gaussian),
            "lanczos3" | "lanczos" => Some(ResizeFilter::Lanczos3),
            _ => None,
        }
    }

    pub fn filter_type(&self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Model artifact path
    pub model_path: PathBuf,
    /// Expected artifact SHA-256 (hex), checked on load when set
    pub model_sha256: Option<String>,
    /// Directory holding persisted history
    pub data_dir: PathBuf,
    /// Storage key for the history collection
    pub history_key: String,
    /// Resize filter for preprocessing
    pub resize_filter: ResizeFilter,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let resize_filter = match std::env::var("CARENEST_RESIZE_FILTER") {
            Ok(raw) => ResizeFilter::parse(&raw).unwrap_or_else(|| {
                log::warn!("Unknown CARENEST_RESIZE_FILTER '{}', using triangle", raw);
                ResizeFilter::default()
            }),
            Err(_) => ResizeFilter::default(),
        };

        Self {
            model_path: PathBuf::from(constants::get_model_path()),
            model_sha256: constants::get_model_sha256(),
            data_dir: constants::get_data_dir(),
            history_key: constants::get_history_key(),
            resize_filter,
        }
    }
}
