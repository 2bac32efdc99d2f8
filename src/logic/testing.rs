//! Test doubles for the model seams.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::constants::{INPUT_CHANNELS, INPUT_SIZE};
use crate::logic::history::{HistoryError, StorageBackend};
use crate::logic::model::{Classifier, InferenceError, ModelLoadError, ModelLoader, ModelSource};
use crate::logic::preprocess::InputTensor;

/// Classifier returning a fixed output vector
pub struct FixedClassifier {
    pub output: Vec<f32>,
}

impl Classifier for FixedClassifier {
    fn predict(&self, input: InputTensor) -> Result<Vec<f32>, InferenceError> {
        if input.shape() != [1, INPUT_SIZE, INPUT_SIZE, INPUT_CHANNELS] {
            return Err(InferenceError(format!("Unexpected input shape {:?}", input.shape())));
        }
        Ok(self.output.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Classifier whose forward pass always fails
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _input: InputTensor) -> Result<Vec<f32>, InferenceError> {
        Err(InferenceError("forward pass exploded".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// In-memory artifact source that counts fetches
pub struct FakeSource {
    pub artifact: Vec<u8>,
    pub output: Option<Vec<f32>>,
    pub failures_before_success: usize,
    pub fetch_delay: Duration,
    pub fetches: AtomicUsize,
}

impl FakeSource {
    pub fn returning(output: Vec<f32>) -> Self {
        Self {
            artifact: b"fake-model-artifact".to_vec(),
            output: Some(output),
            failures_before_success: 0,
            fetch_delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Source whose classifier fails at inference time
    pub fn failing_inference() -> Self {
        Self {
            output: None,
            ..Self::returning(Vec::new())
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ModelSource for FakeSource {
    fn location(&self) -> String {
        "memory://fake-model".to_string()
    }

    fn fetch(&self) -> Result<Vec<u8>, ModelLoadError> {
        let attempt = self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            std::thread::sleep(self.fetch_delay);
        }
        if attempt < self.failures_before_success {
            return Err(ModelLoadError::new(self.location(), "artifact unreachable"));
        }
        Ok(self.artifact.clone())
    }

    fn deserialize(&self, _bytes: &[u8]) -> Result<Box<dyn Classifier>, ModelLoadError> {
        match &self.output {
            Some(output) => Ok(Box::new(FixedClassifier { output: output.clone() })),
            None => Ok(Box::new(FailingClassifier)),
        }
    }
}

pub fn loader_for(source: &Arc<FakeSource>) -> ModelLoader {
    ModelLoader::new(Arc::clone(source) as Arc<dyn ModelSource>)
}

/// PNG bytes of a solid-color image
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

/// Storage that reads fine but refuses every write
pub struct ReadOnlyStorage;

impl StorageBackend for ReadOnlyStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, HistoryError> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), HistoryError> {
        Err(HistoryError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only storage")))
    }

    fn remove_item(&self, _key: &str) -> Result<(), HistoryError> {
        Ok(())
    }
}

/// Storage holding an unreadable history document
pub struct CorruptStorage;

impl StorageBackend for CorruptStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, HistoryError> {
        Ok(Some("{not json".to_string()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), HistoryError> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> Result<(), HistoryError> {
        Ok(())
    }
}
