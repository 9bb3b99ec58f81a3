//! REST endpoints over the file store

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::utils::format_file_size;
use crate::storage::files::{is_allowed_upload, StoredFile};
use crate::web::error::ApiError;
use crate::web::AppState;

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

/// File description returned by the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub size_formatted: String,
    pub url: String,
}

impl From<StoredFile> for FileInfo {
    fn from(file: StoredFile) -> Self {
        Self {
            size_formatted: format_file_size(file.size_bytes),
            filename: file.storage_name,
            original_name: file.display_name,
            size: file.size_bytes,
            url: file.download_url,
        }
    }
}

/// POST /api/upload - store the multipart `file` field
pub async fn upload_file(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Result<Json<Value>, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(ApiError::from_multipart)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let mime = field.content_type().map(str::to_string);
        if !is_allowed_upload(&original_name, mime.as_deref()) {
            log::warn!("Rejected upload {} ({:?})", original_name, mime);
            return Err(ApiError::BadRequest(format!("File type not allowed: {}", original_name)));
        }

        // Stream into the store chunk by chunk; an early return drops the
        // pending upload, which removes the partial file.
        let mut upload = state.store.begin_upload(&original_name).await?;
        while let Some(chunk) = field.chunk().await.map_err(ApiError::from_multipart)? {
            upload.write_chunk(&chunk).await?;
        }
        let stored = upload.finish().await?;
        log::info!("Upload accepted: {} -> {}", original_name, stored.storage_name);

        return Ok(Json(json!({
            "success": true,
            "file": FileInfo::from(stored),
        })));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// GET /api/files - list every stored file
pub async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let files: Vec<FileInfo> = state.store.list().await?.into_iter().map(FileInfo::from).collect();
    let count = files.len();

    Ok(Json(json!({
        "success": true,
        "files": files,
        "count": count,
    })))
}

/// DELETE /api/files/{filename} - remove the first file matching the fragment
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.store.delete(&filename).await? {
        Some(file) => Ok(Json(json!({
            "success": true,
            "message": format!("Deleted {}", file.display_name),
            "file": FileInfo::from(file),
        }))),
        None => Err(ApiError::NotFound(format!("File not found: {}", filename))),
    }
}
