use axum::{Json, extract::State};

use crate::api::ApiResponse;
use crate::cache::VerificationCacheOperations;
use crate::error::AppError;
use crate::routes::user::User;
use crate::utils::{
    generate_reset_token, generate_token, generate_verification_code, hash_password,
    is_valid_email, sha256_hex, verify_password,
};
use crate::AppState;

use super::model::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    SendVerificationCodeRequest, VerifyResetTokenRequest,
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("invalid email address".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if let Some(code) = &req.verification_code {
        let stored = VerificationCacheOperations::get_code(&state.redis, &req.email).await?;
        if stored.as_deref() != Some(code.as_str()) {
            return Err(AppError::Validation("invalid or expired verification code".to_string()));
        }
    }

    if User::find_credentials_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::Validation("email is already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;
    let username = req
        .username
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| req.email.split('@').next().unwrap_or("user").to_string());

    let user = User::create(&state.pool, &username, &req.email, &password_hash).await?;

    if req.verification_code.is_some() {
        // single use
        VerificationCacheOperations::delete_code(&state.redis, &req.email).await.ok();
    }

    let (access_token, expires_at) = generate_token(&user.id, &user.email, &state.config)?;
    tracing::info!("registered user {}", user.id);
    Ok(Json(ApiResponse::success(AuthResponse { user, access_token, expires_at })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let credentials = User::find_credentials_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid email or password".to_string()))?;

    if credentials.status != "active" {
        return Err(AppError::Forbidden("account is suspended".to_string()));
    }

    let valid = verify_password(&req.password, &credentials.password_hash)
        .map_err(|e| AppError::Internal(format!("password verification failed: {}", e)))?;
    if !valid {
        return Err(AppError::Unauthorized("invalid email or password".to_string()));
    }

    let user = User::find_by_id(&state.pool, &credentials.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let (access_token, expires_at) = generate_token(&user.id, &user.email, &state.config)?;
    Ok(Json(ApiResponse::success(AuthResponse { user, access_token, expires_at })))
}

pub async fn send_verification_code(
    State(state): State<AppState>,
    Json(req): Json<SendVerificationCodeRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("invalid email address".to_string()));
    }

    let code = generate_verification_code();
    VerificationCacheOperations::store_code(
        &state.redis,
        &req.email,
        &code,
        state.config.verification_code_ttl_secs,
    )
    .await?;

    // Send-and-forget; the client polls its inbox, not this API.
    let mailer = state.mailer.clone();
    let email = req.email.clone();
    tokio::spawn(async move {
        mailer.send_verification_code(&email, &code).await;
    });

    Ok(Json(ApiResponse::success(serde_json::json!({ "sent": true }))))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    // Always answer the same way so the endpoint cannot be used to probe
    // which emails exist.
    let response = Json(ApiResponse::success(serde_json::json!({ "sent": true })));

    let Some(credentials) = User::find_credentials_by_email(&state.pool, &req.email).await?
    else {
        return Ok(response);
    };

    let token = generate_reset_token();
    VerificationCacheOperations::store_reset_token(
        &state.redis,
        &sha256_hex(&token),
        &credentials.id,
        state.config.reset_token_ttl_secs,
    )
    .await?;

    let mailer = state.mailer.clone();
    let email = credentials.email.clone();
    tokio::spawn(async move {
        mailer.send_password_reset(&email, &token).await;
    });

    Ok(response)
}

pub async fn verify_reset_token(
    State(state): State<AppState>,
    Json(req): Json<VerifyResetTokenRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let user_id =
        VerificationCacheOperations::get_reset_token(&state.redis, &sha256_hex(&req.token))
            .await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "valid": user_id.is_some() }),
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let user_id =
        VerificationCacheOperations::take_reset_token(&state.redis, &sha256_hex(&req.token))
            .await?
            .ok_or_else(|| AppError::Validation("invalid or expired reset token".to_string()))?;

    let password_hash = hash_password(&req.new_password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;
    if !User::set_password_hash(&state.pool, &user_id, &password_hash).await? {
        return Err(AppError::NotFound("user not found".to_string()));
    }

    tracing::info!("password reset for user {}", user_id);
    Ok(Json(ApiResponse::success(serde_json::json!({ "reset": true }))))
}
