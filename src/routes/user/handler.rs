use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::api::ApiResponse;
use crate::error::AppError;
use crate::routes::sermon::UpdateStatusRequest;
use crate::utils::Claims;
use crate::AppState;

use super::model::{UpdateUserRequest, User, UserListQuery};

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let (users, pagination) = User::list(&state.pool, &query).await?;
    Ok(Json(ApiResponse::paginated(users, pagination)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = User::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /users/me - the authenticated caller's own record.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = User::find_by_id(&state.pool, &claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    if let Some(username) = &req.username {
        if username.trim().is_empty() {
            return Err(AppError::Validation("username must not be empty".to_string()));
        }
    }

    let user = User::update(&state.pool, &id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn update_user_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !["active", "suspended"].contains(&req.status.as_str()) {
        return Err(AppError::Validation(format!("invalid status '{}'", req.status)));
    }

    if !User::update_status(&state.pool, &id, &req.status).await? {
        return Err(AppError::NotFound("user not found".to_string()));
    }
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "id": id, "status": req.status }),
    )))
}
