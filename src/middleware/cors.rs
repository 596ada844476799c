use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::Config;
use crate::error::AppError;

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str =
    "Content-Type, Authorization, X-API-Key, X-Client-Type, X-Requested-With";
const EXPOSED_HEADERS: &str = "X-RateLimit-Limit, X-RateLimit-Remaining, X-RateLimit-Reset";
const MAX_AGE_SECS: &str = "86400";

/// Decide whether a request origin may talk to the API.
///
/// An absent origin is always allowed (same-origin requests and non-browser
/// clients). Present origins must exact-match the allow-list or be an https
/// preview-deployment domain. Some mobile runtimes send the literal strings
/// "null"/"undefined"; those pass too.
pub fn is_origin_allowed(config: &Config, origin: Option<&str>) -> bool {
    let Some(origin) = origin else {
        return true;
    };

    if config.allowed_origins.iter().any(|allowed| allowed == origin) {
        return true;
    }

    if origin.starts_with("https://") && origin.ends_with(&config.preview_origin_suffix) {
        return true;
    }

    origin == "null" || origin == "undefined"
}

fn apply_cors_headers(response: &mut Response, origin: Option<&str>) {
    let allow_origin = origin.unwrap_or("*");
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(allow_origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );
}

/// Outermost gate. Rejects disallowed origins, answers OPTIONS preflights
/// before any other middleware runs, and stamps the CORS header set onto
/// every response on the way out, whichever path produced it.
///
/// A rejected origin gets a bare 403 with no CORS headers at all, so the
/// browser blocks the response as well.
pub async fn cors_guard(
    State(config): State<Arc<Config>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    if !is_origin_allowed(&config, origin.as_deref()) {
        tracing::warn!("blocked request from unauthorized origin: {:?}", origin);
        return AppError::Forbidden("origin not allowed".to_string()).into_response();
    }

    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(&mut response, origin.as_deref());
        return response;
    }

    let mut response = next.run(req).await;
    apply_cors_headers(&mut response, origin.as_deref());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_config;

    #[test]
    fn absent_origin_is_allowed() {
        let config = test_config();
        assert!(is_origin_allowed(&config, None));
    }

    #[test]
    fn allow_listed_origin_is_allowed() {
        let config = test_config();
        assert!(is_origin_allowed(&config, Some("https://admin.example.com")));
        assert!(is_origin_allowed(&config, Some("http://localhost:3000")));
    }

    #[test]
    fn preview_deployment_origin_is_allowed() {
        let config = test_config();
        assert!(is_origin_allowed(&config, Some("https://pr-42.project.pages.dev")));
        // only https previews count
        assert!(!is_origin_allowed(&config, Some("http://evil.pages.dev")));
    }

    #[test]
    fn mobile_runtime_pseudo_origins_are_allowed() {
        let config = test_config();
        assert!(is_origin_allowed(&config, Some("null")));
        assert!(is_origin_allowed(&config, Some("undefined")));
    }

    #[test]
    fn unknown_origin_is_rejected() {
        let config = test_config();
        assert!(!is_origin_allowed(&config, Some("https://evil.example.net")));
    }

    #[test]
    fn cors_headers_echo_the_origin() {
        let mut response = StatusCode::OK.into_response();
        apply_cors_headers(&mut response, Some("https://admin.example.com"));
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://admin.example.com"
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_EXPOSE_HEADERS).unwrap(),
            EXPOSED_HEADERS
        );
    }
}
