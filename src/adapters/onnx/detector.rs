use async_trait::async_trait;
use image::RgbImage;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::{DetectorPort, ModelLoaderPort};
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::{ConfidenceThreshold, ModelId, YoloParams},
};

/// ONNX Runtime detector. `Session::run` needs `&mut`, so calls serialize on the mutex.
pub struct OnnxDetector {
    engine: Arc<Mutex<OnnxYoloEngine>>,
}

#[async_trait]
impl DetectorPort for OnnxDetector {
    async fn detect(&self, image: Arc<RgbImage>, threshold: ConfidenceThreshold) -> DomainResult<Vec<Detection>> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || {
            let mut eng = engine
                .lock()
                .map_err(|_| DomainError::Inference("detector lock poisoned".into()))?;
            eng.infer(&image, threshold.value())
                .map_err(|e| DomainError::Inference(e.to_string()))
        })
        .await
        .map_err(|e| DomainError::Inference(format!("inference task failed: {e}")))?
    }
}

pub struct OnnxModelLoader;

impl OnnxModelLoader {
    pub fn new() -> Self { Self }
}

impl Default for OnnxModelLoader {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl ModelLoaderPort for OnnxModelLoader {
    async fn load(&self, model: &ModelId, params: &YoloParams) -> DomainResult<Arc<dyn DetectorPort>> {
        let path = model.onnx_path.clone();
        let params = params.clone();
        info!("Building ONNX session for {} (imgsz {})", path, params.input_size);

        let engine = tokio::task::spawn_blocking(move || OnnxYoloEngine::load(&path, params))
            .await
            .map_err(|e| DomainError::ModelLoad(format!("loader task failed: {e}")))?
            .map_err(|e| DomainError::ModelLoad(format!("{}: {e}", model.onnx_path)))?;

        Ok(Arc::new(OnnxDetector { engine: Arc::new(Mutex::new(engine)) }))
    }
}
