use clap::Parser;
use std::path::PathBuf;

use crate::application::services::ModelHandle;
use crate::domain::model::{ModelId, YoloParams};

/// Filter directive applied when `RUST_LOG` is unset or blank.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Card detection web UI (dashboard at `/`, form at `/form`).
#[derive(Parser, Debug, Clone)]
#[command(name = "cardlens", version, about)]
pub struct Config {
    /// Path to the ONNX export of the card detector
    #[arg(long, env = "CARDLENS_MODEL", default_value = "bestL160epoch.onnx")]
    pub model: String,

    /// Bind host
    #[arg(long, env = "CARDLENS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port
    #[arg(long, env = "CARDLENS_PORT", default_value_t = 7860)]
    pub port: u16,

    /// Directory holding index.html and form.html
    #[arg(long, env = "CARDLENS_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Directory searched for test.jpg / test2.jpg example presets
    #[arg(long, env = "CARDLENS_EXAMPLES_DIR", default_value = ".")]
    pub examples_dir: PathBuf,

    #[arg(long, default_value_t = 640)]
    pub input_size: u32,

    #[arg(long, default_value_t = 0.7)]
    pub iou_threshold: f32,

    #[arg(long, default_value_t = 300)]
    pub max_detections: usize,

    /// Delay before a slider change on the dashboard re-runs detection
    #[arg(long, env = "CARDLENS_DEBOUNCE_MS", default_value_t = 250)]
    pub debounce_ms: u64,

    /// Exit at start-up when the model cannot be loaded instead of serving an error status
    #[arg(long, env = "CARDLENS_REQUIRE_MODEL", default_value_t = false)]
    pub require_model: bool,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model_id(&self) -> ModelId {
        ModelId { onnx_path: self.model.clone() }
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.input_size,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        }
    }

    /// Start-up gate: a failed load is fatal only under `--require-model`.
    pub fn check_model(&self, handle: &ModelHandle) -> anyhow::Result<()> {
        match handle.error() {
            Some(reason) if self.require_model => {
                anyhow::bail!("model load failed for {}: {reason}", handle.model().onnx_path)
            }
            Some(_) => {
                tracing::warn!("⚠️ Serving without a model; detect requests will answer 503");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

pub fn log_filter(rust_log: Option<String>) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}
