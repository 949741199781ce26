//! Decoding of uploaded image bytes.

use image::{ImageFormat, RgbImage};

use crate::domain::errors::{DomainError, DomainResult};

/// Maximum accepted upload (20MB)
pub const MAX_UPLOAD_SIZE: usize = 20 * 1024 * 1024;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Sniffs JPEG/PNG from magic bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    match bytes {
        [0x89, 0x50, 0x4E, 0x47, ..] => Some(ImageFormat::Png),
        [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

/// Dashboard uploads must be JPG/JPEG/PNG, judged by extension when a
/// filename is present and by content otherwise.
pub fn ensure_accepted(filename: Option<&str>, bytes: &[u8]) -> DomainResult<()> {
    if let Some(ext) = filename
        .and_then(|f| std::path::Path::new(f).extension())
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
    {
        if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(());
        }
        return Err(DomainError::InvalidInput(format!(
            "unsupported file type .{ext} (expected JPG, JPEG or PNG)"
        )));
    }
    sniff_format(bytes).map(|_| ()).ok_or_else(|| {
        DomainError::InvalidInput("unsupported image type (expected JPG, JPEG or PNG)".into())
    })
}

pub fn decode_upload(bytes: &[u8]) -> DomainResult<RgbImage> {
    if bytes.is_empty() {
        return Err(DomainError::InvalidInput("image data is empty".into()));
    }
    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(DomainError::InvalidInput(format!(
            "image is too large: {} bytes (max: {} bytes)",
            bytes.len(),
            MAX_UPLOAD_SIZE
        )));
    }
    let img = match sniff_format(bytes) {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    }
    .map_err(|e| DomainError::InvalidInput(format!("failed to decode image: {e}")))?;
    Ok(img.to_rgb8())
}
