use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::api::ApiResponse;
use crate::error::AppError;
use crate::routes::favorite::{FavoriteKind, Favorites};
use crate::routes::topic::PageQuery;
use crate::utils::Claims;
use crate::AppState;

use super::model::{PlayHistory, PlayHistoryEntry, PlayProgress, RecordProgressRequest};

pub async fn list_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<PlayHistoryEntry>>>, AppError> {
    let (entries, pagination) =
        PlayHistory::list(&state.pool, &claims.sub, query.page, query.limit).await?;
    Ok(Json(ApiResponse::paginated(entries, pagination)))
}

pub async fn record_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RecordProgressRequest>,
) -> Result<Json<ApiResponse<PlayProgress>>, AppError> {
    if req.position_secs < 0 {
        return Err(AppError::Validation("position_secs must be non-negative".to_string()));
    }
    if !Favorites::item_exists(&state.pool, FavoriteKind::Sermon, &req.sermon_id).await? {
        return Err(AppError::NotFound("sermon not found".to_string()));
    }

    let progress = PlayHistory::record(&state.pool, &claims.sub, &req).await?;
    Ok(Json(ApiResponse::success(progress)))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(sermon_id): Path<String>,
) -> Result<Json<ApiResponse<PlayProgress>>, AppError> {
    let progress = PlayHistory::progress(&state.pool, &claims.sub, &sermon_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no progress recorded".to_string()))?;
    Ok(Json(ApiResponse::success(progress)))
}

pub async fn delete_history_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(sermon_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !PlayHistory::delete(&state.pool, &claims.sub, &sermon_id).await? {
        return Err(AppError::NotFound("history entry not found".to_string()));
    }
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": sermon_id }),
    )))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let removed = PlayHistory::clear(&state.pool, &claims.sub).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "removed": removed }),
    )))
}
