use std::sync::Arc;
use std::time::Duration;

use ndarray::Array4;

use super::*;
use crate::logic::testing::{loader_for, FakeSource};

fn input() -> Array4<f32> {
    Array4::<f32>::zeros((1, 224, 224, 3))
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let source = Arc::new(FakeSource::returning(vec![0.2, 0.3, 0.5]));
    let loader = loader_for(&source);

    assert!(!loader.is_loaded());

    let first = loader.load().await.unwrap();
    let second = loader.load().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.fetches(), 1);
    assert_eq!(loader.fetch_count(), 1);
    assert!(loader.is_loaded());
}

#[tokio::test]
async fn test_failed_load_leaves_cache_empty_and_retries() {
    let source = Arc::new(FakeSource {
        failures_before_success: 1,
        ..FakeSource::returning(vec![1.0, 0.0, 0.0])
    });
    let loader = loader_for(&source);

    let err = loader.load().await.unwrap_err();
    assert_eq!(err.location, "memory://fake-model");
    assert!(err.to_string().contains("memory://fake-model"));
    assert!(!loader.is_loaded());
    assert!(loader.get().is_none());

    loader.load().await.unwrap();
    assert!(loader.is_loaded());
    assert_eq!(source.fetches(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_loads_fetch_once() {
    let source = Arc::new(FakeSource {
        fetch_delay: Duration::from_millis(50),
        ..FakeSource::returning(vec![0.1, 0.8, 0.1])
    });
    let loader = Arc::new(loader_for(&source));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let loader = Arc::clone(&loader);
        handles.push(tokio::spawn(async move { loader.load().await.unwrap() }));
    }

    let mut models = Vec::new();
    for handle in handles {
        models.push(handle.await.unwrap());
    }

    assert_eq!(source.fetches(), 1);
    assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn test_checksum_pinning() {
    let source = Arc::new(FakeSource::returning(vec![1.0, 0.0, 0.0]));
    let expected = artifact_checksum(&source.artifact);

    let loader = loader_for(&source).with_expected_sha256(Some(expected.to_uppercase()));
    let model = loader.load().await.unwrap();
    assert!(model.verify_checksum(&expected));
    assert_eq!(model.metadata().sha256, expected);
    assert_eq!(model.metadata().size_bytes, source.artifact.len());

    let bad = loader_for(&source).with_expected_sha256(Some("00".repeat(32)));
    let err = bad.load().await.unwrap_err();
    assert!(err.reason.contains("Checksum mismatch"));
    assert!(!bad.is_loaded());
}

#[tokio::test]
async fn test_missing_artifact_names_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.onnx");

    let loader = ModelLoader::from_path(&path);
    let err = loader.load().await.unwrap_err();

    assert!(err.to_string().contains("missing.onnx"));
    assert_eq!(loader.fetch_count(), 1);
    assert!(!loader.is_loaded());
}

#[tokio::test]
async fn test_corrupt_artifact_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.onnx");
    std::fs::write(&path, b"not an onnx graph").unwrap();

    let loader = ModelLoader::from_path(&path);
    let err = loader.load().await.unwrap_err();

    assert_eq!(err.location, path.display().to_string());
    assert!(!loader.is_loaded());
}

#[tokio::test]
async fn test_run_inference_returns_raw_output_and_tracks_stats() {
    let source = Arc::new(FakeSource::returning(vec![0.05, 0.15, 0.8]));
    let model = loader_for(&source).load().await.unwrap();

    let output = run_inference(Arc::clone(&model), input()).await.unwrap();

    assert_eq!(output, vec![0.05, 0.15, 0.8]);
    assert_eq!(model.stats().inference_count(), 1);
}

#[tokio::test]
async fn test_run_inference_propagates_failure() {
    let source = Arc::new(FakeSource::failing_inference());
    let model = loader_for(&source).load().await.unwrap();

    let err = run_inference(Arc::clone(&model), input()).await.unwrap_err();

    assert!(err.to_string().contains("forward pass exploded"));
    assert_eq!(model.stats().inference_count(), 0);
}
