use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

/// Checks that a model path points at an ONNX file before a session is built.
#[derive(Default)]
pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.trim().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        let path = Path::new(&model.onnx_path);
        if !path.is_file() {
            return Err(DomainError::NotFound(format!("model file not found: {}", model.onnx_path)));
        }
        if path.extension().map_or(true, |e| !e.eq_ignore_ascii_case("onnx")) {
            return Err(DomainError::InvalidInput(format!(
                "expected an .onnx export, got {}",
                model.onnx_path
            )));
        }
        Ok(())
    }
}
