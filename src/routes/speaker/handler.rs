use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::ApiResponse;
use crate::cache::ResponseCacheOperations;
use crate::error::AppError;
use crate::routes::sermon::{Sermon, SermonListQuery};
use crate::AppState;

use super::model::{CreateSpeakerRequest, Speaker, SpeakerListQuery, UpdateSpeakerRequest};
use crate::routes::sermon::UpdateStatusRequest;

async fn purge_speaker_cache(state: &AppState) {
    match ResponseCacheOperations::purge(&state.redis, "speakers").await {
        Ok(removed) => tracing::debug!("purged {} cached speaker responses", removed),
        Err(e) => tracing::warn!("speaker cache purge failed: {}", e),
    }
}

pub async fn list_speakers(
    State(state): State<AppState>,
    Query(query): Query<SpeakerListQuery>,
) -> Result<Json<ApiResponse<Vec<Speaker>>>, AppError> {
    let (speakers, pagination) = Speaker::list(&state.pool, &query).await?;
    Ok(Json(ApiResponse::paginated(speakers, pagination)))
}

pub async fn get_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Speaker>>, AppError> {
    let speaker = Speaker::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("speaker not found".to_string()))?;
    Ok(Json(ApiResponse::success(speaker)))
}

/// GET /speakers/{id}/sermons - the speaker's sermons, same filters as the
/// main sermon list.
pub async fn get_speaker_sermons(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(mut query): Query<SermonListQuery>,
) -> Result<Json<ApiResponse<Vec<Sermon>>>, AppError> {
    if Speaker::find_by_id(&state.pool, &id).await?.is_none() {
        return Err(AppError::NotFound("speaker not found".to_string()));
    }

    query.speaker_id = Some(id);
    let (sermons, pagination) = Sermon::list(&state.pool, &query).await?;
    Ok(Json(ApiResponse::paginated(sermons, pagination)))
}

pub async fn create_speaker(
    State(state): State<AppState>,
    Json(req): Json<CreateSpeakerRequest>,
) -> Result<Json<ApiResponse<Speaker>>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let speaker = Speaker::create(&state.pool, req).await?;
    purge_speaker_cache(&state).await;
    Ok(Json(ApiResponse::success(speaker)))
}

pub async fn update_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSpeakerRequest>,
) -> Result<Json<ApiResponse<Speaker>>, AppError> {
    let speaker = Speaker::update(&state.pool, &id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("speaker not found".to_string()))?;
    purge_speaker_cache(&state).await;
    Ok(Json(ApiResponse::success(speaker)))
}

pub async fn update_speaker_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !["active", "inactive"].contains(&req.status.as_str()) {
        return Err(AppError::Validation(format!("invalid status '{}'", req.status)));
    }

    if !Speaker::update_status(&state.pool, &id, &req.status).await? {
        return Err(AppError::NotFound("speaker not found".to_string()));
    }
    purge_speaker_cache(&state).await;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "id": id, "status": req.status }),
    )))
}

pub async fn delete_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    // Refuse to orphan sermons; the admin has to reassign or delete them
    // first.
    let count = Speaker::sermon_count(&state.pool, &id).await?;
    if count > 0 {
        return Err(AppError::BadRequest(format!(
            "speaker still has {} sermons, reassign or delete them first",
            count
        )));
    }

    if !Speaker::delete(&state.pool, &id).await? {
        return Err(AppError::NotFound("speaker not found".to_string()));
    }
    purge_speaker_cache(&state).await;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}
