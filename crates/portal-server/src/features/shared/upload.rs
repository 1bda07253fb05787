//! Multipart CSV upload extraction

use axum::extract::Multipart;

use crate::api::response::AppError;
use crate::ingest::Upload;

/// Multipart field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

/// Pull the `file` field out of a multipart body
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Uploaded file has no filename".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file bytes: {}", e)))?;

        return Ok(Upload::new(filename, data.to_vec()));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}
