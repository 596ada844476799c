use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::api::ApiResponse;
use crate::error::AppError;
use crate::routes::topic::PageQuery;
use crate::utils::Claims;
use crate::AppState;

use super::model::{
    AddSermonFavoriteRequest, AddSpeakerFavoriteRequest, AddTopicFavoriteRequest, FavoriteKind,
    FavoriteSermonRow, FavoriteSpeakerRow, FavoriteTopicRow, Favorites,
};

async fn add_favorite(
    state: &AppState,
    kind: FavoriteKind,
    user_id: &str,
    item_id: &str,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !Favorites::item_exists(&state.pool, kind, item_id).await? {
        return Err(AppError::NotFound(format!(
            "{} not found",
            kind.item_column().trim_end_matches("_id")
        )));
    }

    let inserted = Favorites::add(&state.pool, kind, user_id, item_id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "favorited": true,
        "already_favorited": !inserted,
    }))))
}

async fn remove_favorite(
    state: &AppState,
    kind: FavoriteKind,
    user_id: &str,
    item_id: &str,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !Favorites::remove(&state.pool, kind, user_id, item_id).await? {
        return Err(AppError::NotFound("favorite not found".to_string()));
    }
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "removed": item_id }),
    )))
}

async fn check_favorite(
    state: &AppState,
    kind: FavoriteKind,
    user_id: &str,
    item_id: &str,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let favorited = Favorites::exists(&state.pool, kind, user_id, item_id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "favorited": favorited }),
    )))
}

pub async fn list_sermon_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<FavoriteSermonRow>>>, AppError> {
    let (rows, pagination) =
        Favorites::list_sermons(&state.pool, &claims.sub, query.page, query.limit).await?;
    Ok(Json(ApiResponse::paginated(rows, pagination)))
}

pub async fn add_sermon_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddSermonFavoriteRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    add_favorite(&state, FavoriteKind::Sermon, &claims.sub, &req.sermon_id).await
}

pub async fn remove_sermon_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(sermon_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    remove_favorite(&state, FavoriteKind::Sermon, &claims.sub, &sermon_id).await
}

pub async fn check_sermon_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(sermon_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    check_favorite(&state, FavoriteKind::Sermon, &claims.sub, &sermon_id).await
}

pub async fn list_speaker_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<FavoriteSpeakerRow>>>, AppError> {
    let (rows, pagination) =
        Favorites::list_speakers(&state.pool, &claims.sub, query.page, query.limit).await?;
    Ok(Json(ApiResponse::paginated(rows, pagination)))
}

pub async fn add_speaker_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddSpeakerFavoriteRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    add_favorite(&state, FavoriteKind::Speaker, &claims.sub, &req.speaker_id).await
}

pub async fn remove_speaker_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(speaker_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    remove_favorite(&state, FavoriteKind::Speaker, &claims.sub, &speaker_id).await
}

pub async fn check_speaker_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(speaker_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    check_favorite(&state, FavoriteKind::Speaker, &claims.sub, &speaker_id).await
}

pub async fn list_topic_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<FavoriteTopicRow>>>, AppError> {
    let (rows, pagination) =
        Favorites::list_topics(&state.pool, &claims.sub, query.page, query.limit).await?;
    Ok(Json(ApiResponse::paginated(rows, pagination)))
}

pub async fn add_topic_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddTopicFavoriteRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    add_favorite(&state, FavoriteKind::Topic, &claims.sub, &req.topic_id).await
}

pub async fn remove_topic_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(topic_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    remove_favorite(&state, FavoriteKind::Topic, &claims.sub, &topic_id).await
}

pub async fn check_topic_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(topic_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    check_favorite(&state, FavoriteKind::Topic, &claims.sub, &topic_id).await
}
