use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::api::ApiResponse;
use crate::error::AppError;
use crate::routes::sermon::{CreateSermonRequest, Sermon};
use crate::routes::topic::PageQuery;
use crate::utils::Claims;
use crate::AppState;

use super::model::{Submissions, SubmitSermonRequest};

pub async fn list_my_submissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Sermon>>>, AppError> {
    let (sermons, pagination) =
        Submissions::list(&state.pool, &claims.sub, query.page, query.limit).await?;
    Ok(Json(ApiResponse::paginated(sermons, pagination)))
}

pub async fn submit_sermon(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitSermonRequest>,
) -> Result<Json<ApiResponse<Sermon>>, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if req.audio_url.trim().is_empty() {
        return Err(AppError::Validation("audio_url is required".to_string()));
    }

    // Listener submissions always enter the review queue.
    let sermon = Sermon::create(
        &state.pool,
        CreateSermonRequest {
            title: req.title,
            description: req.description,
            audio_url: req.audio_url,
            image_url: req.image_url,
            duration: req.duration,
            speaker_id: req.speaker_id,
            submitter_id: Some(claims.sub.clone()),
            status: Some("pending".to_string()),
            publish_date: None,
            tags: req.tags,
        },
    )
    .await?;

    tracing::info!("submission {} from user {}", sermon.id, claims.sub);
    Ok(Json(ApiResponse::success(sermon)))
}

pub async fn get_my_submission(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Sermon>>, AppError> {
    let sermon = Submissions::find(&state.pool, &claims.sub, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("submission not found".to_string()))?;
    Ok(Json(ApiResponse::success(sermon)))
}

pub async fn withdraw_submission(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if Submissions::find(&state.pool, &claims.sub, &id).await?.is_none() {
        return Err(AppError::NotFound("submission not found".to_string()));
    }
    if !Submissions::delete_pending(&state.pool, &claims.sub, &id).await? {
        return Err(AppError::BadRequest(
            "only pending submissions can be withdrawn".to_string(),
        ));
    }
    Ok(Json(ApiResponse::success(serde_json::json!({ "withdrawn": id }))))
}
