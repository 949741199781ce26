use axum::{body::Bytes, extract::Multipart};

use crate::adapters::http::errors::ApiError;
use crate::domain::model::ConfidenceThreshold;

pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Bytes,
}

/// Fields of the `image` + `confidence` multipart form both front-ends post.
pub struct DetectForm {
    pub image: Option<UploadedFile>,
    pub confidence: ConfidenceThreshold,
}

pub async fn read_detect_form(mut multipart: Multipart) -> Result<DetectForm, ApiError> {
    let mut image = None;
    let mut confidence = ConfidenceThreshold::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read image: {e}")))?;
                // browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    image = Some(UploadedFile { filename, bytes });
                }
            }
            Some("confidence") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read confidence: {e}")))?;
                confidence = ConfidenceThreshold::parse(&text)?;
            }
            _ => {}
        }
    }

    Ok(DetectForm { image, confidence })
}
