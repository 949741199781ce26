use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::{
    application::{
        ports::{AnnotatorPort, DetectorPort, ModelCatalogPort, ModelLoaderPort},
        upload::decode_upload,
    },
    domain::{
        classes::ClassRegistry,
        detection::Detection,
        errors::{DomainError, DomainResult},
        model::{ConfidenceThreshold, ModelId, YoloParams},
        report::{self, DetectionReport},
    },
};

/// Outcome of the one-time model initialization, shared read-only by every request.
#[derive(Clone)]
pub enum ModelHandle {
    Loaded {
        model: ModelId,
        detector: Arc<dyn DetectorPort>,
    },
    Failed {
        model: ModelId,
        reason: String,
    },
}

impl ModelHandle {
    pub fn model(&self) -> &ModelId {
        match self {
            ModelHandle::Loaded { model, .. } | ModelHandle::Failed { model, .. } => model,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelHandle::Loaded { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ModelHandle::Loaded { .. } => None,
            ModelHandle::Failed { reason, .. } => Some(reason),
        }
    }

    pub fn detector(&self) -> DomainResult<&Arc<dyn DetectorPort>> {
        match self {
            ModelHandle::Loaded { detector, .. } => Ok(detector),
            ModelHandle::Failed { reason, .. } => Err(DomainError::ModelLoad(reason.clone())),
        }
    }
}

/// Validates and loads the detector artifact once at start-up.
#[derive(Clone)]
pub struct ModelService {
    catalog: Arc<dyn ModelCatalogPort>,
    loader: Arc<dyn ModelLoaderPort>,
}

impl ModelService {
    pub fn new(catalog: Arc<dyn ModelCatalogPort>, loader: Arc<dyn ModelLoaderPort>) -> Self {
        Self { catalog, loader }
    }

    /// Never fails: a load error is recorded in the handle so both front-ends
    /// can report it instead of crashing the process.
    pub async fn initialize(&self, model: ModelId, params: &YoloParams) -> ModelHandle {
        match self.try_load(&model, params).await {
            Ok(detector) => {
                info!("Model loaded from {}", model.onnx_path);
                ModelHandle::Loaded { model, detector }
            }
            Err(e) => {
                error!("Model load failed for {}: {}", model.onnx_path, e);
                // `detector()` re-wraps the reason in `ModelLoad`; keep only the inner message.
                let reason = match e {
                    DomainError::ModelLoad(msg) => msg,
                    other => other.to_string(),
                };
                ModelHandle::Failed { model, reason }
            }
        }
    }

    async fn try_load(&self, model: &ModelId, params: &YoloParams) -> DomainResult<Arc<dyn DetectorPort>> {
        self.catalog
            .validate_model(model)
            .await
            .map_err(|e| DomainError::ModelLoad(e.to_string()))?;
        self.loader.load(model, params).await
    }
}

pub struct InferenceOutcome {
    pub width: u32,
    pub height: u32,
    pub infer_ms: f32,
    pub annotated_png: Vec<u8>,
    pub detections: Vec<Detection>,
    pub report: DetectionReport,
}

/// Shared predict-and-format pipeline behind both front-ends.
#[derive(Clone)]
pub struct DetectionService {
    model: Arc<ModelHandle>,
    annotator: Arc<dyn AnnotatorPort>,
    registry: ClassRegistry,
}

impl DetectionService {
    pub fn new(model: Arc<ModelHandle>, annotator: Arc<dyn AnnotatorPort>, registry: ClassRegistry) -> Self {
        Self { model, annotator, registry }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub async fn infer(&self, bytes: &[u8], threshold: ConfidenceThreshold) -> DomainResult<InferenceOutcome> {
        let detector = self.model.detector()?;
        let image = Arc::new(decode_upload(bytes)?);
        let (width, height) = image.dimensions();

        let t_start = Instant::now();
        let detections = detector.detect(image.clone(), threshold).await?;
        let infer_ms = t_start.elapsed().as_secs_f32() * 1000.0;

        let report = report::summarize(&detections, &self.registry)?;
        match &report {
            DetectionReport::Found { rows } => info!(
                "{}x{} @ conf {:.2}: {} detections ({}) in {:.1} ms",
                width,
                height,
                threshold.value(),
                rows.len(),
                report::label_counts(&detections, &self.registry),
                infer_ms
            ),
            DetectionReport::Empty => warn!(
                "{}x{} @ conf {:.2}: no detections in {:.1} ms",
                width,
                height,
                threshold.value(),
                infer_ms
            ),
        }

        let annotator = self.annotator.clone();
        let boxes = detections.clone();
        let annotated_png = tokio::task::spawn_blocking(move || {
            encode_png(&annotator.annotate(&image, &boxes))
        })
        .await
        .map_err(|e| DomainError::Inference(format!("annotation task failed: {e}")))??;

        Ok(InferenceOutcome { width, height, infer_ms, annotated_png, detections, report })
    }
}

pub fn encode_png(image: &RgbImage) -> DomainResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| DomainError::Inference(format!("failed to encode annotated image: {e}")))?;
    Ok(buf.into_inner())
}
