use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cache::{CachedResponse, ResponseCacheOperations};
use crate::config::Config;
use crate::error::AppError;

/// Responses are JSON; anything bigger than this is not worth caching and
/// points at a bug upstream.
const MAX_CACHEABLE_BODY: usize = 4 * 1024 * 1024;

fn storable_len(len: u64) -> bool {
    len <= MAX_CACHEABLE_BODY as u64
}

/// Whether and for how long a GET response may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Per-user data. Never stored, stamped no-store.
    Private,
    /// Curated configuration that changes rarely.
    Static,
    /// Everything else; short-lived.
    Dynamic,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Private => "private",
            CacheTier::Static => "static",
            CacheTier::Dynamic => "dynamic",
        }
    }

    pub fn cache_control(&self, config: &Config) -> String {
        match self {
            CacheTier::Private => "no-cache, no-store, must-revalidate".to_string(),
            CacheTier::Static => format!(
                "public, max-age={}, stale-while-revalidate={}",
                config.cache_static_max_age_secs, config.cache_static_swr_secs
            ),
            CacheTier::Dynamic => format!(
                "public, max-age={}, stale-while-revalidate={}",
                config.cache_dynamic_max_age_secs, config.cache_dynamic_swr_secs
            ),
        }
    }

    /// Entry lifetime in the store; the declared max-age.
    pub fn ttl_secs(&self, config: &Config) -> u64 {
        match self {
            CacheTier::Private => 0,
            CacheTier::Static => config.cache_static_max_age_secs,
            CacheTier::Dynamic => config.cache_dynamic_max_age_secs,
        }
    }
}

/// Classify a request path into a cache tier. Most specific match wins:
/// per-user resources are private, curated config is static, the rest is
/// dynamic.
pub fn classify_tier(path: &str) -> CacheTier {
    let Some(rest) = path.strip_prefix("/api/v1/") else {
        return CacheTier::Dynamic;
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["favorites", ..]
        | ["speaker-favorites", ..]
        | ["topic-favorites", ..]
        | ["history", ..]
        | ["submissions", ..]
        | ["auth", ..]
        | ["users", "me", ..] => CacheTier::Private,
        ["home", "config"] | ["curation", ..] | ["launch-screen"] => CacheTier::Static,
        _ => CacheTier::Dynamic,
    }
}

fn stamp(response: &mut Response, cache_control: &str, status_marker: &str, tier: CacheTier) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(cache_control) {
        headers.insert(header::CACHE_CONTROL, value.clone());
        if tier != CacheTier::Private {
            headers.insert("CDN-Cache-Control", value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(status_marker) {
        headers.insert("X-Cache-Status", value);
    }
    headers.insert(
        "X-Cache-Strategy",
        HeaderValue::from_static(tier.as_str()),
    );
}

#[derive(Clone)]
pub struct CacheContext {
    pub redis: Arc<redis::Client>,
    pub config: Arc<Config>,
}

/// Response cache around the business handlers. GET only; a hit is served
/// without invoking the handler, a miss stores the 2xx response in the
/// background so the client never waits on the write.
pub async fn response_cache(
    State(ctx): State<Arc<CacheContext>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let uri = req
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let tier = classify_tier(req.uri().path());

    if tier == CacheTier::Private {
        let mut response = next.run(req).await;
        stamp(&mut response, &tier.cache_control(&ctx.config), "MISS", tier);
        return response;
    }

    match ResponseCacheOperations::get(&ctx.redis, &uri).await {
        Ok(Some(cached)) => {
            tracing::debug!("cache hit: {}", uri);
            let mut response = (
                StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK),
                [(header::CONTENT_TYPE, cached.content_type.clone())],
                cached.body.clone(),
            )
                .into_response();
            stamp(&mut response, &cached.cache_control, "HIT", tier);
            return response;
        }
        Ok(None) => {}
        Err(e) => {
            // Cache is best-effort; a broken store must not break reads.
            tracing::warn!("response cache unavailable, skipping: {}", e);
            return next.run(req).await;
        }
    }

    let response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    // Declared-oversized bodies go out uncached without being buffered.
    let declared_len = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared_len.is_some_and(|len| !storable_len(len)) {
        let mut response = response;
        stamp(&mut response, &tier.cache_control(&ctx.config), "MISS", tier);
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("failed to buffer response for caching: {}", e);
            return AppError::Internal("failed to read response body".to_string())
                .into_response();
        }
    };

    if !storable_len(bytes.len() as u64) {
        tracing::warn!("response for {} too large to cache ({} bytes)", uri, bytes.len());
        let mut response = Response::from_parts(parts, Body::from(bytes));
        stamp(&mut response, &tier.cache_control(&ctx.config), "MISS", tier);
        return response;
    }

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let cache_control = tier.cache_control(&ctx.config);

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        content_type,
        cache_control: cache_control.clone(),
        tier: tier.as_str().to_string(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };

    // Detached write: the response goes out regardless of how (or whether)
    // the store write finishes.
    let redis = ctx.redis.clone();
    let ttl = tier.ttl_secs(&ctx.config);
    let store_uri = uri.clone();
    tokio::spawn(async move {
        if let Err(e) = ResponseCacheOperations::put(&redis, &store_uri, &cached, ttl).await {
            tracing::warn!("cache store failed for {}: {}", store_uri, e);
        }
    });

    let mut response = Response::from_parts(parts, Body::from(bytes));
    stamp(&mut response, &cache_control, "MISS", tier);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_config;

    #[test]
    fn per_user_paths_are_private() {
        for path in [
            "/api/v1/favorites",
            "/api/v1/favorites/sermon-1",
            "/api/v1/speaker-favorites",
            "/api/v1/topic-favorites/t-1",
            "/api/v1/history",
            "/api/v1/history/sermon-1/progress",
            "/api/v1/submissions",
            "/api/v1/users/me",
            "/api/v1/auth/login",
        ] {
            assert_eq!(classify_tier(path), CacheTier::Private, "path {}", path);
        }
    }

    #[test]
    fn curated_config_is_static() {
        for path in [
            "/api/v1/home/config",
            "/api/v1/curation/home-config",
            "/api/v1/curation/discover-config",
            "/api/v1/curation/launch-screen-config",
            "/api/v1/launch-screen",
        ] {
            assert_eq!(classify_tier(path), CacheTier::Static, "path {}", path);
        }
    }

    #[test]
    fn everything_else_is_dynamic() {
        assert_eq!(classify_tier("/api/v1/sermons"), CacheTier::Dynamic);
        assert_eq!(classify_tier("/api/v1/speakers/sp-1"), CacheTier::Dynamic);
        assert_eq!(classify_tier("/api/v1/users/u-1"), CacheTier::Dynamic);
    }

    #[test]
    fn cache_control_strings_per_tier() {
        let config = test_config();
        assert_eq!(
            CacheTier::Private.cache_control(&config),
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(
            CacheTier::Static.cache_control(&config),
            "public, max-age=3600, stale-while-revalidate=86400"
        );
        assert_eq!(
            CacheTier::Dynamic.cache_control(&config),
            "public, max-age=300, stale-while-revalidate=60"
        );
    }

    #[test]
    fn oversized_bodies_are_served_but_not_stored() {
        assert!(storable_len(0));
        assert!(storable_len(MAX_CACHEABLE_BODY as u64));
        assert!(!storable_len(MAX_CACHEABLE_BODY as u64 + 1));
    }

    #[test]
    fn entry_ttl_is_the_declared_max_age() {
        let config = test_config();
        assert_eq!(CacheTier::Static.ttl_secs(&config), 3600);
        assert_eq!(CacheTier::Dynamic.ttl_secs(&config), 300);
    }
}
