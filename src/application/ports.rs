use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;

use crate::domain::{
    detection::Detection,
    errors::DomainResult,
    model::{ConfidenceThreshold, ModelId, YoloParams},
};

#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, image: Arc<RgbImage>, threshold: ConfidenceThreshold) -> DomainResult<Vec<Detection>>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}

#[async_trait]
pub trait ModelLoaderPort: Send + Sync {
    async fn load(&self, model: &ModelId, params: &YoloParams) -> DomainResult<Arc<dyn DetectorPort>>;
}

/// Draws detections onto a copy of the image.
pub trait AnnotatorPort: Send + Sync {
    fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage;
}
