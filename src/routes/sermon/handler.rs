use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::ApiResponse;
use crate::cache::ResponseCacheOperations;
use crate::error::AppError;
use crate::AppState;

use super::model::{
    CreateSermonRequest, Sermon, SermonListQuery, UpdateSermonRequest, UpdateStatusRequest,
};

const VALID_STATUSES: &[&str] = &["draft", "pending", "published", "archived"];

/// Drop cached sermon views after a mutation. Best effort.
async fn purge_sermon_cache(state: &AppState) {
    match ResponseCacheOperations::purge(&state.redis, "sermons").await {
        Ok(removed) => tracing::debug!("purged {} cached sermon responses", removed),
        Err(e) => tracing::warn!("sermon cache purge failed: {}", e),
    }
}

pub async fn list_sermons(
    State(state): State<AppState>,
    Query(query): Query<SermonListQuery>,
) -> Result<Json<ApiResponse<Vec<Sermon>>>, AppError> {
    let (sermons, pagination) = Sermon::list(&state.pool, &query).await?;
    Ok(Json(ApiResponse::paginated(sermons, pagination)))
}

pub async fn get_sermon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Sermon>>, AppError> {
    let sermon = Sermon::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("sermon not found".to_string()))?;
    Ok(Json(ApiResponse::success(sermon)))
}

pub async fn create_sermon(
    State(state): State<AppState>,
    Json(req): Json<CreateSermonRequest>,
) -> Result<Json<ApiResponse<Sermon>>, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if req.audio_url.trim().is_empty() {
        return Err(AppError::Validation("audio_url is required".to_string()));
    }

    let sermon = Sermon::create(&state.pool, req).await?;
    purge_sermon_cache(&state).await;
    Ok(Json(ApiResponse::success(sermon)))
}

pub async fn update_sermon(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSermonRequest>,
) -> Result<Json<ApiResponse<Sermon>>, AppError> {
    let sermon = Sermon::update(&state.pool, &id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("sermon not found".to_string()))?;
    purge_sermon_cache(&state).await;
    Ok(Json(ApiResponse::success(sermon)))
}

pub async fn update_sermon_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !VALID_STATUSES.contains(&req.status.as_str()) {
        return Err(AppError::Validation(format!("invalid status '{}'", req.status)));
    }

    if !Sermon::update_status(&state.pool, &id, &req.status).await? {
        return Err(AppError::NotFound("sermon not found".to_string()));
    }
    purge_sermon_cache(&state).await;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "id": id, "status": req.status }),
    )))
}

pub async fn delete_sermon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !Sermon::delete(&state.pool, &id).await? {
        return Err(AppError::NotFound("sermon not found".to_string()));
    }
    purge_sermon_cache(&state).await;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}
