use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

pub const DEFAULT_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelId {
    pub onnx_path: String,
}

/// Per-request confidence threshold, always within [0, 1].
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ConfidenceThreshold(f32);

impl ConfidenceThreshold {
    pub fn new(value: f32) -> DomainResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(DomainError::InvalidInput(format!(
                "confidence must be within [0, 1], got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value: f32 = raw
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidInput(format!("confidence is not a number: {raw:?}")))?;
        Self::new(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        Self(DEFAULT_CONFIDENCE)
    }
}

/// Detector parameters fixed at start-up; the threshold travels per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,        // 640 typical
    pub iou_threshold: f32,     // 0..1
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}
