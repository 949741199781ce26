use clap::Parser;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::EnvFilter;

use cardlens::adapters::{
    http::{router, state::HttpState},
    onnx::{detector::OnnxModelLoader, model_catalog::OnnxModelCatalog},
    render::annotator::BoxAnnotator,
};
use cardlens::application::{
    dto::UiConfigResponse,
    presets::PresetCatalog,
    services::{DetectionService, ModelService},
};
use cardlens::config::{log_filter, Config};
use cardlens::domain::{classes::ClassRegistry, model::DEFAULT_CONFIDENCE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging (RUST_LOG=info by default)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter(std::env::var("RUST_LOG").ok())))
        .init();

    let cfg = Config::parse();

    // 2. Load the model once; both front-ends share the resulting handle.
    tracing::info!("🔧 Loading model {}", cfg.model);
    let model_service = ModelService::new(Arc::new(OnnxModelCatalog::new()), Arc::new(OnnxModelLoader::new()));
    let handle = model_service.initialize(cfg.model_id(), &cfg.yolo_params()).await;
    cfg.check_model(&handle)?;

    // 3. Services + HTTP state
    let detection = Arc::new(DetectionService::new(
        Arc::new(handle),
        Arc::new(BoxAnnotator::new(ClassRegistry::default())?),
        ClassRegistry::default(),
    ));
    let presets = PresetCatalog::scan(&cfg.examples_dir);
    tracing::info!("📷 {} example preset(s) available", presets.presets().len());

    let state = HttpState {
        detection,
        presets: Arc::new(presets),
        ui: Arc::new(UiConfigResponse::new(DEFAULT_CONFIDENCE, cfg.debounce_ms)),
    };

    // 4. Router + static pages
    let app = router(state)
        .route_service("/form", ServeFile::new(cfg.static_dir.join("form.html")))
        .fallback_service(ServeDir::new(&cfg.static_dir));

    // 5. Serve
    let addr = cfg.bind_addr();
    tracing::info!("🚀 Dashboard at http://{}/ , form at http://{}/form", addr, addr);
    tracing::info!("📂 Static files served from {}", cfg.static_dir.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
