use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::ApiResponse;
use crate::error::AppError;
use crate::routes::favorite::{FavoriteKind, Favorites};
use crate::AppState;

use super::model::{
    FavoritesTrendPoint, OverviewCounts, Stats, TopFavoritedSermon, TopFavoritedSpeaker,
};

fn default_top_limit() -> u32 {
    10
}

fn default_trend_days() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(rename = "_limit", default = "default_top_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    #[serde(default = "default_trend_days")]
    pub days: u32,
}

pub async fn get_overview(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OverviewCounts>>, AppError> {
    let counts = Stats::overview(&state.pool).await?;
    Ok(Json(ApiResponse::success(counts)))
}

pub async fn get_top_sermons(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<ApiResponse<Vec<TopFavoritedSermon>>>, AppError> {
    let rows = Stats::top_sermons(&state.pool, query.limit).await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn get_top_speakers(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<ApiResponse<Vec<TopFavoritedSpeaker>>>, AppError> {
    let rows = Stats::top_speakers(&state.pool, query.limit).await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn get_sermon_favorite_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !Favorites::item_exists(&state.pool, FavoriteKind::Sermon, &id).await? {
        return Err(AppError::NotFound("sermon not found".to_string()));
    }
    let count = Stats::sermon_favorite_count(&state.pool, &id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "id": id, "favorite_count": count }),
    )))
}

pub async fn get_speaker_favorite_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !Favorites::item_exists(&state.pool, FavoriteKind::Speaker, &id).await? {
        return Err(AppError::NotFound("speaker not found".to_string()));
    }
    let count = Stats::speaker_favorite_count(&state.pool, &id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "id": id, "favorite_count": count }),
    )))
}

pub async fn get_favorites_trend(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<ApiResponse<Vec<FavoritesTrendPoint>>>, AppError> {
    let points = Stats::favorites_trend(&state.pool, query.days).await?;
    Ok(Json(ApiResponse::success(points)))
}
