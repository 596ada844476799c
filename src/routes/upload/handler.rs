use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use chrono::Utc;

use crate::api::ApiResponse;
use crate::error::AppError;
use crate::utils::generate_id;
use crate::AppState;

const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Audio,
    Image,
}

impl UploadKind {
    fn folder(&self) -> &'static str {
        match self {
            UploadKind::Audio => "audio",
            UploadKind::Image => "images",
        }
    }

    /// File extension for an accepted content type, None if the type does
    /// not belong to this kind.
    fn extension_for(&self, content_type: &str) -> Option<&'static str> {
        let table: &[(&str, &str)] = match self {
            UploadKind::Audio => &[
                ("audio/mpeg", "mp3"),
                ("audio/mp4", "m4a"),
                ("audio/aac", "aac"),
                ("audio/wav", "wav"),
                ("audio/x-wav", "wav"),
            ],
            UploadKind::Image => &[
                ("image/jpeg", "jpg"),
                ("image/png", "png"),
                ("image/webp", "webp"),
                ("image/gif", "gif"),
            ],
        };
        table.iter().find(|(ct, _)| *ct == content_type).map(|(_, ext)| *ext)
    }
}

fn storage_path(folder: &str, ext: &str) -> String {
    let now = Utc::now();
    format!("{}/{}/{}.{}", folder, now.format("%Y/%m"), generate_id("file"), ext)
}

async fn handle_upload(
    state: &AppState,
    mut multipart: Multipart,
    kind: UploadKind,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .ok_or_else(|| {
                AppError::Validation("file part must declare a content type".to_string())
            })?;

        let ext = kind.extension_for(&content_type).ok_or_else(|| {
            AppError::Validation(format!("unsupported content type '{}'", content_type))
        })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation("uploaded file is too large".to_string()));
        }

        let path = storage_path(kind.folder(), ext);
        let url = state
            .blobs
            .put(&path, bytes.to_vec(), &content_type)
            .await
            .map_err(|e| AppError::Internal(format!("blob upload failed: {}", e)))?;

        tracing::info!("stored upload {} ({} bytes)", path, bytes.len());
        return Ok(Json(ApiResponse::success(serde_json::json!({
            "path": path,
            "url": url,
            "content_type": content_type,
            "size": bytes.len(),
        }))));
    }

    Err(AppError::Validation("missing 'file' part".to_string()))
}

pub async fn upload_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    handle_upload(&state, multipart, UploadKind::Audio).await
}

pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    handle_upload(&state, multipart, UploadKind::Image).await
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    state
        .blobs
        .delete(&path)
        .await
        .map_err(|e| AppError::Internal(format!("blob delete failed: {}", e)))?;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": path }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_accept_only_their_content_types() {
        assert_eq!(UploadKind::Audio.extension_for("audio/mpeg"), Some("mp3"));
        assert_eq!(UploadKind::Audio.extension_for("image/png"), None);
        assert_eq!(UploadKind::Image.extension_for("image/png"), Some("png"));
        assert_eq!(UploadKind::Image.extension_for("application/pdf"), None);
    }

    #[test]
    fn storage_paths_are_foldered_by_month() {
        let path = storage_path("audio", "mp3");
        assert!(path.starts_with("audio/"));
        assert!(path.ends_with(".mp3"));
        assert_ne!(path, storage_path("audio", "mp3"));
    }
}
