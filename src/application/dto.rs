use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::{
    application::{presets::Preset, services::{InferenceOutcome, ModelHandle}, upload::ACCEPTED_EXTENSIONS},
    domain::{
        classes::{ClassGroup, ClassRegistry},
        detection::BoundingBox,
        errors::DomainResult,
        report::{self, Banner, DetectionReport, DetectionRow},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDto {
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub annotated_image: String,
    pub width: u32,
    pub height: u32,
    pub infer_ms: f32,
    pub rows: Vec<DetectionRow>,
    pub banner: Banner,
    pub detections: Vec<DetectionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormResponse {
    pub annotated_image: Option<String>,
    pub details: String,
    pub detections: Vec<DetectionDto>,
}

pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png))
}

fn detection_dtos(outcome: &InferenceOutcome, registry: &ClassRegistry) -> DomainResult<Vec<DetectionDto>> {
    // labels were already validated by report::summarize
    let rows = report::format_rows(&outcome.detections, registry)?;
    Ok(outcome
        .detections
        .iter()
        .zip(rows)
        .map(|(d, row)| DetectionDto {
            class_id: d.class_id,
            label: row.label,
            confidence: d.score,
            bbox: d.bbox,
        })
        .collect())
}

impl DashboardResponse {
    pub fn from_outcome(outcome: &InferenceOutcome, registry: &ClassRegistry) -> DomainResult<Self> {
        let rows = match &outcome.report {
            DetectionReport::Found { rows } => rows.clone(),
            DetectionReport::Empty => Vec::new(),
        };
        Ok(Self {
            annotated_image: png_data_url(&outcome.annotated_png),
            width: outcome.width,
            height: outcome.height,
            infer_ms: outcome.infer_ms,
            rows,
            banner: report::dashboard_banner(&outcome.report),
            detections: detection_dtos(outcome, registry)?,
        })
    }
}

impl FormResponse {
    pub fn from_outcome(outcome: &InferenceOutcome, registry: &ClassRegistry) -> DomainResult<Self> {
        Ok(Self {
            annotated_image: Some(png_data_url(&outcome.annotated_png)),
            details: report::form_text(&outcome.report),
            detections: detection_dtos(outcome, registry)?,
        })
    }

    pub fn missing_image() -> Self {
        Self {
            annotated_image: None,
            details: "Please upload an image".to_string(),
            detections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub model_loaded: bool,
    pub model_path: String,
    pub error: Option<String>,
}

impl From<&ModelHandle> for StatusResponse {
    fn from(handle: &ModelHandle) -> Self {
        Self {
            model_loaded: handle.is_loaded(),
            model_path: handle.model().onnx_path.clone(),
            error: handle.error().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderConfig {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfigResponse {
    pub confidence: SliderConfig,
    pub debounce_ms: u64,
    pub accepted_types: Vec<String>,
}

impl UiConfigResponse {
    pub fn new(default_confidence: f32, debounce_ms: u64) -> Self {
        Self {
            confidence: SliderConfig { min: 0.0, max: 1.0, step: 0.05, default: default_confidence },
            debounce_ms,
            accepted_types: ACCEPTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassesResponse {
    pub total: usize,
    pub groups: Vec<ClassGroup>,
}

impl From<&ClassRegistry> for ClassesResponse {
    fn from(registry: &ClassRegistry) -> Self {
        Self { total: registry.len(), groups: registry.grouped() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplesResponse {
    pub examples: Vec<Preset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}
