use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use crate::adapters::http::{errors::ApiError, state::HttpState, upload::read_detect_form};
use crate::application::{
    dto::{ClassesResponse, DashboardResponse, ExamplesResponse, FormResponse, StatusResponse},
    upload::ensure_accepted,
};

pub async fn get_status(State(st): State<HttpState>) -> Json<StatusResponse> {
    Json(StatusResponse::from(st.detection.model()))
}

pub async fn get_config(State(st): State<HttpState>) -> impl IntoResponse {
    Json((*st.ui).clone())
}

pub async fn list_classes(State(st): State<HttpState>) -> Json<ClassesResponse> {
    Json(ClassesResponse::from(st.detection.registry()))
}

pub async fn list_examples(State(st): State<HttpState>) -> Json<ExamplesResponse> {
    Json(ExamplesResponse { examples: st.presets.presets().to_vec() })
}

pub async fn get_example(State(st): State<HttpState>, Path(name): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let bytes = st.presets.read(&name).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

/// Dashboard front-end: JPG/JPEG/PNG only, answers with a table and a banner.
pub async fn dashboard_detect(
    State(st): State<HttpState>,
    multipart: Multipart,
) -> Result<Json<DashboardResponse>, ApiError> {
    let form = read_detect_form(multipart).await?;
    let image = form
        .image
        .ok_or_else(|| ApiError::bad_request("image is required"))?;
    ensure_accepted(image.filename.as_deref(), &image.bytes)?;
    debug!(
        "dashboard detect: {:?}, {} bytes, conf {:.2}",
        image.filename,
        image.bytes.len(),
        form.confidence.value()
    );

    let outcome = st.detection.infer(&image.bytes, form.confidence).await?;
    Ok(Json(DashboardResponse::from_outcome(&outcome, st.detection.registry())?))
}

/// Form front-end: runs on explicit submit, answers with a text block.
pub async fn form_predict(
    State(st): State<HttpState>,
    multipart: Multipart,
) -> Result<Json<FormResponse>, ApiError> {
    let form = read_detect_form(multipart).await?;
    let Some(image) = form.image else {
        return Ok(Json(FormResponse::missing_image()));
    };
    debug!("form predict: {} bytes, conf {:.2}", image.bytes.len(), form.confidence.value());

    let outcome = st.detection.infer(&image.bytes, form.confidence).await?;
    Ok(Json(FormResponse::from_outcome(&outcome, st.detection.registry())?))
}
