//! Image Preprocessor
//!
//! Decode user-supplied bytes (JPEG/PNG) into the model input tensor:
//! batch 1, 224 x 224, RGB (NHWC), normalized.

use image::imageops::FilterType;
use ndarray::Array4;
use thiserror::Error;

use crate::constants::{INPUT_CHANNELS, INPUT_SIZE};

/// Model input tensor, shape `[1, 224, 224, 3]`
pub type InputTensor = Array4<f32>;

#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("Image input is empty")]
    Empty,
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has zero size ({width}x{height})")]
    ZeroSize { width: u32, height: u32 },
    #[error("Tensor shape error: {0}")]
    Shape(String),
    #[error("Decode task failed: {0}")]
    Task(String),
}

/// Two-step normalization the classifier was trained against:
/// `byte / 255`, then `/ 127.5 - 1` on the scaled value.
#[inline]
pub fn normalize_channel(byte: u8) -> f32 {
    let scaled = byte as f32 / 255.0;
    scaled / 127.5 - 1.0
}

/// Decode, resize to 224x224 (alpha dropped) and normalize.
///
/// The decoded bitmap is owned by this call and released on every return path.
pub fn preprocess(image_bytes: &[u8], filter: FilterType) -> Result<InputTensor, ImageDecodeError> {
    if image_bytes.is_empty() {
        return Err(ImageDecodeError::Empty);
    }

    let decoded = image::load_from_memory(image_bytes)?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(ImageDecodeError::ZeroSize {
            width: decoded.width(),
            height: decoded.height(),
        });
    }

    log::debug!(
        "Decoded {}x{} image ({:?}), resizing to {}x{}",
        decoded.width(),
        decoded.height(),
        decoded.color(),
        INPUT_SIZE,
        INPUT_SIZE
    );

    let size = INPUT_SIZE as u32;
    let rgb = decoded.resize_exact(size, size, filter).to_rgb8();
    drop(decoded);

    let mut data = Vec::with_capacity(INPUT_SIZE * INPUT_SIZE * INPUT_CHANNELS);
    for pixel in rgb.pixels() {
        data.extend_from_slice(&[
            normalize_channel(pixel[0]),
            normalize_channel(pixel[1]),
            normalize_channel(pixel[2]),
        ]);
    }

    Array4::from_shape_vec((1, INPUT_SIZE, INPUT_SIZE, INPUT_CHANNELS), data)
        .map_err(|e| ImageDecodeError::Shape(e.to_string()))
}

// ============================================================================
// UNIT TESTS
// ============================================================================
