use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cache::RateLimitCacheOperations;
use crate::config::{Config, RateQuota};
use crate::error::AppError;

/// Sentinel quota advertised to fully trusted first-party clients.
const UNLIMITED: u32 = 999_999;

/// Sensitive operations get a strict quota regardless of anything else.
const SENSITIVE_PATHS: &[&str] = &[
    "/api/v1/auth/login",
    "/api/v1/auth/register",
    "/api/v1/auth/send-verification-code",
];

/// Client types that skip rate limiting entirely; both carry their own
/// API-key protection.
const TRUSTED_CLIENT_TYPES: &[&str] = &["admin-panel", "ios-app"];

/// Coarse bucket used to pick a quota for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    Public,
    Authenticated,
    SemiTrusted,
    Sensitive,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Public => "public",
            EndpointClass::Authenticated => "authenticated",
            EndpointClass::SemiTrusted => "semi_trusted",
            EndpointClass::Sensitive => "sensitive",
        }
    }

    pub fn quota(&self, config: &Config) -> RateQuota {
        match self {
            EndpointClass::Public => config.rate_limit_public,
            EndpointClass::Authenticated => config.rate_limit_authenticated,
            EndpointClass::SemiTrusted => config.rate_limit_semi_trusted,
            EndpointClass::Sensitive => config.rate_limit_sensitive,
        }
    }
}

pub fn is_trusted_client(client_type: Option<&str>) -> bool {
    client_type.is_some_and(|t| TRUSTED_CLIENT_TYPES.contains(&t))
}

/// Classify a request into an endpoint class. Precedence: sensitive paths,
/// then any mutation, then the semi-trusted client header, then public.
pub fn classify_endpoint(path: &str, method: &Method, client_type: Option<&str>) -> EndpointClass {
    if SENSITIVE_PATHS.contains(&path) {
        return EndpointClass::Sensitive;
    }
    if method != Method::GET {
        return EndpointClass::Authenticated;
    }
    if client_type == Some("share-web") {
        return EndpointClass::SemiTrusted;
    }
    EndpointClass::Public
}

/// 从请求头中获取IP，或者使用连接信息中的IP作为默认值
fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("CF-Connecting-IP")
        .or_else(|| req.headers().get("X-Real-IP"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .or(remote_ip)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Quota metadata surfaced via X-RateLimit-* headers.
#[derive(Debug, Clone, Copy)]
pub struct QuotaMeta {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub retry_after_secs: Option<u64>,
    /// None when the counter store failed and we let the request through
    /// without advertising any quota.
    pub meta: Option<QuotaMeta>,
}

impl RateLimitDecision {
    fn unlimited() -> Self {
        RateLimitDecision {
            allowed: true,
            retry_after_secs: None,
            meta: Some(QuotaMeta { limit: UNLIMITED, remaining: UNLIMITED, reset_at: None }),
        }
    }

    fn fail_open() -> Self {
        RateLimitDecision { allowed: true, retry_after_secs: None, meta: None }
    }
}

/// Turn a post-increment counter reading into a decision.
///
/// The increment has already been counted, so a rejected request still
/// consumed one slot of the window; this is deliberate and consistent.
pub fn evaluate(
    count: u32,
    window_remaining_secs: u64,
    quota: RateQuota,
    now_unix: i64,
) -> RateLimitDecision {
    let reset_at = Some(now_unix + window_remaining_secs as i64);
    if count > quota.max_requests {
        RateLimitDecision {
            allowed: false,
            retry_after_secs: Some(window_remaining_secs.max(1)),
            meta: Some(QuotaMeta { limit: quota.max_requests, remaining: 0, reset_at }),
        }
    } else {
        RateLimitDecision {
            allowed: true,
            retry_after_secs: None,
            meta: Some(QuotaMeta {
                limit: quota.max_requests,
                remaining: quota.max_requests - count,
                reset_at,
            }),
        }
    }
}

fn apply_quota_headers(response: &mut Response, meta: &QuotaMeta) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&meta.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&meta.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Some(reset_at) = meta.reset_at {
        if let Ok(value) = HeaderValue::from_str(&reset_at.to_string()) {
            headers.insert("X-RateLimit-Reset", value);
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
}

impl RateLimiter {
    pub fn new(redis: Arc<redis::Client>, config: Arc<Config>) -> Self {
        Self { redis, config }
    }

    /// Count one request against the `(class, ip)` window and decide.
    /// Takes the extracted request data by value; the request itself never
    /// crosses the store round-trip.
    async fn check(&self, client_ip: &str, path: &str, class: EndpointClass) -> RateLimitDecision {
        let quota = class.quota(&self.config);

        match RateLimitCacheOperations::increment(
            &self.redis,
            class.as_str(),
            client_ip,
            quota.window_secs,
        )
        .await
        {
            Ok((count, window_remaining)) => {
                let decision =
                    evaluate(count, window_remaining, quota, chrono::Utc::now().timestamp());
                if !decision.allowed {
                    tracing::warn!(
                        "rate limit exceeded for {} on {} ({})",
                        client_ip,
                        path,
                        class.as_str()
                    );
                }
                decision
            }
            Err(e) => {
                // 计数器不可用时放行，不能因为 Redis 故障拒绝所有请求
                tracing::warn!("rate limit store unavailable, failing open: {}", e);
                RateLimitDecision::fail_open()
            }
        }
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client_type = req
        .headers()
        .get("X-Client-Type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let decision = if is_trusted_client(client_type.as_deref()) {
        RateLimitDecision::unlimited()
    } else {
        // 先提取所需的请求信息，再进行计数
        let ip = client_ip(&req);
        let path = req.uri().path().to_string();
        let class = classify_endpoint(&path, req.method(), client_type.as_deref());
        limiter.check(&ip, &path, class).await
    };

    if !decision.allowed {
        let retry_after = decision.retry_after_secs.unwrap_or(1);
        let mut response = AppError::RateLimited {
            message: format!("too many requests, retry in {} seconds", retry_after),
            retry_after_secs: retry_after,
        }
        .into_response();
        if let Some(meta) = &decision.meta {
            apply_quota_headers(&mut response, meta);
        }
        return response;
    }

    let mut response = next.run(req).await;
    if let Some(meta) = &decision.meta {
        apply_quota_headers(&mut response, meta);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_config;

    fn quota(max_requests: u32, window_secs: u64) -> RateQuota {
        RateQuota { max_requests, window_secs }
    }

    #[test]
    fn sensitive_paths_win_over_method() {
        let class = classify_endpoint("/api/v1/auth/login", &Method::POST, None);
        assert_eq!(class, EndpointClass::Sensitive);
        let class = classify_endpoint("/api/v1/auth/register", &Method::POST, Some("share-web"));
        assert_eq!(class, EndpointClass::Sensitive);
    }

    #[test]
    fn mutations_are_authenticated_class() {
        let class = classify_endpoint("/api/v1/sermons", &Method::POST, None);
        assert_eq!(class, EndpointClass::Authenticated);
        let class = classify_endpoint("/api/v1/sermons/s-1", &Method::DELETE, None);
        assert_eq!(class, EndpointClass::Authenticated);
    }

    #[test]
    fn share_web_reads_are_semi_trusted() {
        let class = classify_endpoint("/api/v1/sermons", &Method::GET, Some("share-web"));
        assert_eq!(class, EndpointClass::SemiTrusted);
    }

    #[test]
    fn plain_reads_are_public() {
        let class = classify_endpoint("/api/v1/sermons", &Method::GET, None);
        assert_eq!(class, EndpointClass::Public);
    }

    #[test]
    fn trusted_clients_bypass_entirely() {
        assert!(is_trusted_client(Some("admin-panel")));
        assert!(is_trusted_client(Some("ios-app")));
        assert!(!is_trusted_client(Some("share-web")));
        assert!(!is_trusted_client(None));

        let decision = RateLimitDecision::unlimited();
        assert!(decision.allowed);
        assert_eq!(decision.meta.unwrap().limit, UNLIMITED);
    }

    #[test]
    fn client_ip_prefers_proxy_headers() {
        let req = Request::builder()
            .header("X-Real-IP", " 9.9.9.9 ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "9.9.9.9");

        let req = Request::builder()
            .header("CF-Connecting-IP", "1.2.3.4")
            .header("X-Real-IP", "9.9.9.9")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "1.2.3.4");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), "unknown");
    }

    #[tokio::test]
    async fn quota_check_can_run_on_a_spawned_task() {
        // spawn requires the check future to be Send; an unreachable store
        // must still fail open
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(redis::Client::open("redis://127.0.0.1:1").unwrap()),
            Arc::new(test_config()),
        ));
        let decision = tokio::spawn(async move {
            limiter.check("1.2.3.4", "/api/v1/sermons", EndpointClass::Public).await
        })
        .await
        .unwrap();

        assert!(decision.allowed);
        assert!(decision.meta.is_none());
    }

    #[test]
    fn first_request_of_window_leaves_max_minus_one() {
        let decision = evaluate(1, 3600, quota(10, 3600), 1_000);
        assert!(decision.allowed);
        let meta = decision.meta.unwrap();
        assert_eq!(meta.remaining, 9);
        assert_eq!(meta.reset_at, Some(4_600));
    }

    #[test]
    fn request_at_the_limit_is_still_allowed() {
        let decision = evaluate(10, 120, quota(10, 3600), 0);
        assert!(decision.allowed);
        assert_eq!(decision.meta.unwrap().remaining, 0);
    }

    #[test]
    fn request_past_the_limit_is_rejected_with_positive_retry() {
        let decision = evaluate(11, 120, quota(10, 3600), 0);
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, Some(120));
        let meta = decision.meta.unwrap();
        assert_eq!(meta.remaining, 0);
        assert_eq!(meta.limit, 10);
    }

    #[test]
    fn retry_after_is_never_zero() {
        let decision = evaluate(11, 0, quota(10, 3600), 0);
        assert_eq!(decision.retry_after_secs, Some(1));
    }

    #[test]
    fn fresh_window_resets_remaining() {
        // after the window lapses the counter key is gone, so the next
        // increment reads 1 again
        let decision = evaluate(1, 3600, quota(10, 3600), 10_000);
        assert_eq!(decision.meta.unwrap().remaining, 9);
    }

    #[test]
    fn fail_open_advertises_no_quota() {
        let decision = RateLimitDecision::fail_open();
        assert!(decision.allowed);
        assert!(decision.meta.is_none());
    }
}
