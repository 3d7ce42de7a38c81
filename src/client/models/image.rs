//! Image upload and OCR models

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Image extensions the OCR service accepts, with their MIME types
const IMAGE_TYPES: [(&str, &str); 6] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
    ("bmp", "image/bmp"),
];

/// An image file ready for multipart upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl ImageUpload {
    /// Read and check an image file before anything touches the network
    pub fn from_path(path: &Path) -> ApiResult<Self> {
        let mime_type = mime_for(path).ok_or_else(|| {
            ApiError::Validation(format!(
                "Unsupported image type: {} (expected one of: png, jpg, jpeg, webp, heic, bmp)",
                path.display()
            ))
        })?;

        if !path.is_file() {
            return Err(ApiError::Validation(format!(
                "Image file not found: {}",
                path.display()
            )));
        }

        let bytes = std::fs::read(path).map_err(|e| {
            ApiError::Validation(format!("Could not read {}: {}", path.display(), e))
        })?;
        if bytes.is_empty() {
            return Err(ApiError::Validation(format!(
                "Image file is empty: {}",
                path.display()
            )));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self {
            bytes,
            file_name,
            mime_type: mime_type.to_string(),
        })
    }
}

/// MIME type for a supported image extension (case-insensitive)
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Response to `POST /api/image/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub task_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Text recognized from a question image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,

    /// LaTeX rendering of any math in the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,

    /// Recognition confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,
}
