pub mod errors;
pub mod routes;
pub mod state;
pub mod upload;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use tower_http::trace::TraceLayer;

use crate::adapters::http::state::HttpState;
use crate::application::upload::MAX_UPLOAD_SIZE;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/status", get(routes::get_status))
        .route("/api/config", get(routes::get_config))
        .route("/api/classes", get(routes::list_classes))
        .route("/api/examples", get(routes::list_examples))
        .route("/api/examples/:name", get(routes::get_example))
        .route("/api/dashboard/detect", post(routes::dashboard_detect))
        .route("/api/form/predict", post(routes::form_predict))
        // multipart framing on top of the largest accepted image
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
