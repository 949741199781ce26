use std::sync::Arc;

use crate::application::{dto::UiConfigResponse, presets::PresetCatalog, services::DetectionService};

/// Shared state for the axum handlers; every field is read-only after start-up.
#[derive(Clone)]
pub struct HttpState {
    /// Predict-and-format pipeline shared by both front-ends.
    pub detection: Arc<DetectionService>,
    /// Example images found on disk at start-up.
    pub presets: Arc<PresetCatalog>,
    pub ui: Arc<UiConfigResponse>,
}
