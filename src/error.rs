use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::api::{ApiResponse, ErrorCode};

/// Application-wide error type. Every handler and middleware rejection is
/// funneled through here so that all failure responses share the
/// `{success:false, error:{code,message}}` envelope.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Validation(String),
    RateLimited { message: String, retry_after_secs: u64 },
    Database(sqlx::Error),
    Cache(redis::RedisError),
    Internal(String),
}

impl AppError {
    fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            AppError::Database(_) | AppError::Cache(_) => ErrorCode::ServerError,
            AppError::Internal(_) => ErrorCode::InternalServerError,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Infrastructure details never leak here.
    fn message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Validation(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::RateLimited { message, .. } => message.clone(),
            AppError::Database(_) => "database error".to_string(),
            AppError::Cache(_) => "cache error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("database error: {}", e),
            AppError::Cache(e) => tracing::error!("cache error: {}", e),
            AppError::Internal(msg) => tracing::error!("internal error: {}", msg),
            _ => {}
        }

        let status = self.status();
        let body = Json(ApiResponse::<()>::failure(self.code(), self.message()));

        let mut response = (status, body).into_response();
        if let AppError::RateLimited { retry_after_secs, .. } = &self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("resource not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Cache(e)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::Unauthorized("invalid or expired token".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_taxonomy() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::RateLimited { message: "x".into(), retry_after_secs: 5 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn infrastructure_errors_do_not_leak_details() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.message(), "database error");
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response =
            AppError::RateLimited { message: "slow down".into(), retry_after_secs: 42 }
                .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
