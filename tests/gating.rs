use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use sermon_backend::api::{ApiResponse, ErrorCode};
use sermon_backend::config::{ApiKeyDescriptor, Config, Permission, RateQuota};
use sermon_backend::middleware::{api_key_guard, cors_guard};

fn test_config() -> Config {
    let mut api_keys = HashMap::new();
    api_keys.insert(
        "admin-panel-key".to_string(),
        ApiKeyDescriptor {
            name: "Admin Panel".into(),
            permissions: vec![Permission::Read, Permission::Write, Permission::Admin],
            rate_limit_class: "authenticated".into(),
            allowed_endpoints: vec!["*".into()],
        },
    );

    Config {
        database_url: "postgres://localhost/test".into(),
        redis_url: "redis://localhost".into(),
        jwt_secret: "test-secret".into(),
        jwt_expiration_secs: 3600,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_base_uri: "/api/v1".into(),
        allowed_origins: vec!["https://admin.example.com".into()],
        preview_origin_suffix: ".pages.dev".into(),
        api_keys,
        rate_limit_public: RateQuota { max_requests: 5000, window_secs: 3600 },
        rate_limit_authenticated: RateQuota { max_requests: 10000, window_secs: 3600 },
        rate_limit_semi_trusted: RateQuota { max_requests: 1000, window_secs: 3600 },
        rate_limit_sensitive: RateQuota { max_requests: 10, window_secs: 3600 },
        cache_static_max_age_secs: 3600,
        cache_static_swr_secs: 86400,
        cache_dynamic_max_age_secs: 300,
        cache_dynamic_swr_secs: 60,
        verification_code_ttl_secs: 600,
        reset_token_ttl_secs: 1800,
        mail_api_url: "http://localhost:0/send".into(),
        mail_from_email: "support@example.com".into(),
        mail_from_name: "Test".into(),
        blob_store_url: "http://localhost:0/blobs".into(),
        blob_store_token: "token".into(),
        blob_public_url: "http://localhost:0/public".into(),
    }
}

async fn list_stub() -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(vec!["sermon-1".to_string()]))
}

async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure(ErrorCode::NotFound, "resource not found".to_string())),
    )
}

/// The gating layers that run without external services: origin guard on the
/// outside, API key gate inside it, handlers behind both.
fn app() -> Router {
    let config = Arc::new(test_config());
    Router::new()
        .route("/api/v1/sermons", get(list_stub))
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(config.clone(), api_key_guard))
        .layer(axum::middleware::from_fn_with_state(config, cors_guard))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn preflight_short_circuits_with_cors_headers() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/sermons")
                .header(header::ORIGIN, "https://admin.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://admin.example.com"
    );
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn disallowed_origin_is_blocked_without_cors_headers() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/sermons")
                .header(header::ORIGIN, "https://evil.example.net")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let body = body_json(response).await;
    assert_eq!(body["success"], serde_json::json!(false));
    assert_eq!(body["error"]["code"], serde_json::json!("FORBIDDEN"));
}

#[tokio::test]
async fn public_read_passes_without_key_and_gets_cors_headers() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/sermons")
                .header(header::ORIGIN, "https://admin.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://admin.example.com"
    );

    let body = body_json(response).await;
    assert_eq!(body["success"], serde_json::json!(true));
    assert_eq!(body["data"][0], serde_json::json!("sermon-1"));
}

#[tokio::test]
async fn unknown_api_key_gets_generic_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/sermons")
                .header("X-API-Key", "bogus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], serde_json::json!("UNAUTHORIZED"));
    assert_eq!(body["error"]["message"], serde_json::json!("invalid or missing API key"));
}

#[tokio::test]
async fn keyless_request_to_private_path_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/favorites")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unmatched_route_returns_structured_not_found() {
    // Bearer tokens pass the key gate; the router fallback answers.
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/does-not-exist")
                .header(header::AUTHORIZATION, "Bearer some-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], serde_json::json!(false));
    assert_eq!(body["error"]["code"], serde_json::json!("NOT_FOUND"));
}

#[tokio::test]
async fn admin_key_reaches_protected_surface() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/sermons")
                .header("X-API-Key", "admin-panel-key")
                .header(header::ORIGIN, "https://admin.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
