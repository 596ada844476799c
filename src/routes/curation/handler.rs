use axum::{Json, extract::State};
use serde_json::Value;

use crate::api::ApiResponse;
use crate::cache::ResponseCacheOperations;
use crate::error::AppError;
use crate::AppState;

use super::model::{
    AppConfig, AppConfigEntry, KEY_DISCOVER_CONFIG, KEY_HOME_CONFIG, KEY_LAUNCH_SCREEN,
};

// A config document can be cached under more than one URI spelling
// (client path and admin curation path), so each write purges a set of
// patterns.
async fn purge_config_cache(state: &AppState, patterns: &[&str]) {
    for pattern in patterns {
        match ResponseCacheOperations::purge(&state.redis, pattern).await {
            Ok(removed) => {
                tracing::debug!("purged {} cached responses for '{}'", removed, pattern)
            }
            Err(e) => tracing::warn!("config cache purge failed for '{}': {}", pattern, e),
        }
    }
}

async fn get_config(state: &AppState, key: &str) -> Result<Json<ApiResponse<Value>>, AppError> {
    let value = AppConfig::get(&state.pool, key)
        .await?
        .map(|e| e.value)
        .unwrap_or_else(|| Value::Object(Default::default()));
    Ok(Json(ApiResponse::success(value)))
}

async fn put_config(
    state: &AppState,
    key: &str,
    value: Value,
    purge_patterns: &[&str],
) -> Result<Json<ApiResponse<AppConfigEntry>>, AppError> {
    let entry = AppConfig::set(&state.pool, key, &value).await?;
    purge_config_cache(state, purge_patterns).await;
    Ok(Json(ApiResponse::success(entry)))
}

async fn patch_config(
    state: &AppState,
    key: &str,
    patch: Value,
    purge_patterns: &[&str],
) -> Result<Json<ApiResponse<AppConfigEntry>>, AppError> {
    let entry = AppConfig::merge(&state.pool, key, &patch).await?;
    purge_config_cache(state, purge_patterns).await;
    Ok(Json(ApiResponse::success(entry)))
}

// Client-facing reads.

pub async fn get_home_config(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    get_config(&state, KEY_HOME_CONFIG).await
}

pub async fn get_launch_screen(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    get_config(&state, KEY_LAUNCH_SCREEN).await
}

// Admin curation surface.

pub async fn get_curation_home_config(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    get_config(&state, KEY_HOME_CONFIG).await
}

pub async fn put_curation_home_config(
    State(state): State<AppState>,
    Json(value): Json<Value>,
) -> Result<Json<ApiResponse<AppConfigEntry>>, AppError> {
    put_config(&state, KEY_HOME_CONFIG, value, &["home/config", "home-config"]).await
}

pub async fn patch_curation_home_config(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> Result<Json<ApiResponse<AppConfigEntry>>, AppError> {
    patch_config(&state, KEY_HOME_CONFIG, patch, &["home/config", "home-config"]).await
}

pub async fn get_curation_discover_config(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    get_config(&state, KEY_DISCOVER_CONFIG).await
}

pub async fn put_curation_discover_config(
    State(state): State<AppState>,
    Json(value): Json<Value>,
) -> Result<Json<ApiResponse<AppConfigEntry>>, AppError> {
    put_config(&state, KEY_DISCOVER_CONFIG, value, &["discover-config"]).await
}

pub async fn patch_curation_discover_config(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> Result<Json<ApiResponse<AppConfigEntry>>, AppError> {
    patch_config(&state, KEY_DISCOVER_CONFIG, patch, &["discover-config"]).await
}

pub async fn get_curation_launch_screen(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    get_config(&state, KEY_LAUNCH_SCREEN).await
}

pub async fn put_curation_launch_screen(
    State(state): State<AppState>,
    Json(value): Json<Value>,
) -> Result<Json<ApiResponse<AppConfigEntry>>, AppError> {
    put_config(&state, KEY_LAUNCH_SCREEN, value, &["launch-screen"]).await
}

pub async fn patch_curation_launch_screen(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> Result<Json<ApiResponse<AppConfigEntry>>, AppError> {
    patch_config(&state, KEY_LAUNCH_SCREEN, patch, &["launch-screen"]).await
}
