use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::ApiResponse;
use crate::cache::ResponseCacheOperations;
use crate::error::AppError;
use crate::routes::sermon::{Sermon, UpdateStatusRequest};
use crate::AppState;

use super::model::{
    CreateTopicRequest, ReplaceTopicSermonsRequest, Topic, UpdateTopicRequest,
};

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "_page", default = "default_page")]
    pub page: u32,
    #[serde(rename = "_limit", default = "default_limit")]
    pub limit: u32,
}

async fn purge_topic_cache(state: &AppState) {
    match ResponseCacheOperations::purge(&state.redis, "topics").await {
        Ok(removed) => tracing::debug!("purged {} cached topic responses", removed),
        Err(e) => tracing::warn!("topic cache purge failed: {}", e),
    }
}

pub async fn list_topics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Topic>>>, AppError> {
    let topics = Topic::list(&state.pool).await?;
    Ok(Json(ApiResponse::success(topics)))
}

pub async fn get_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Topic>>, AppError> {
    let topic = Topic::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("topic not found".to_string()))?;
    Ok(Json(ApiResponse::success(topic)))
}

pub async fn get_topic_sermons(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Sermon>>>, AppError> {
    if Topic::find_by_id(&state.pool, &id).await?.is_none() {
        return Err(AppError::NotFound("topic not found".to_string()));
    }

    let (sermons, pagination) = Topic::sermons(&state.pool, &id, query.page, query.limit).await?;
    Ok(Json(ApiResponse::paginated(sermons, pagination)))
}

pub async fn create_topic(
    State(state): State<AppState>,
    Json(req): Json<CreateTopicRequest>,
) -> Result<Json<ApiResponse<Topic>>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let topic = Topic::create(&state.pool, req).await?;
    purge_topic_cache(&state).await;
    Ok(Json(ApiResponse::success(topic)))
}

pub async fn update_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTopicRequest>,
) -> Result<Json<ApiResponse<Topic>>, AppError> {
    let topic = Topic::update(&state.pool, &id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("topic not found".to_string()))?;
    purge_topic_cache(&state).await;
    Ok(Json(ApiResponse::success(topic)))
}

pub async fn replace_topic_sermons(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReplaceTopicSermonsRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if Topic::find_by_id(&state.pool, &id).await?.is_none() {
        return Err(AppError::NotFound("topic not found".to_string()));
    }

    Topic::replace_sermons(&state.pool, &id, &req.sermon_ids).await?;
    purge_topic_cache(&state).await;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "id": id, "sermon_count": req.sermon_ids.len() }),
    )))
}

pub async fn update_topic_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !["active", "inactive"].contains(&req.status.as_str()) {
        return Err(AppError::Validation(format!("invalid status '{}'", req.status)));
    }

    if !Topic::update_status(&state.pool, &id, &req.status).await? {
        return Err(AppError::NotFound("topic not found".to_string()));
    }
    purge_topic_cache(&state).await;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "id": id, "status": req.status }),
    )))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !Topic::delete(&state.pool, &id).await? {
        return Err(AppError::NotFound("topic not found".to_string()));
    }
    purge_topic_cache(&state).await;
    Ok(Json(ApiResponse::success(serde_json::json!({ "deleted": id }))))
}
