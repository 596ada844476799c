mod api_key;
mod auth;
mod cache;
mod cors;
mod error_handler;
mod rate_limit;

pub use api_key::{ClientIdentity, api_key_guard, authenticate, is_public_read_path};
pub use auth::session_auth;
pub use cache::{CacheContext, CacheTier, classify_tier, response_cache};
pub use cors::{cors_guard, is_origin_allowed};
pub use error_handler::log_errors;
pub use rate_limit::{
    EndpointClass, RateLimitDecision, RateLimiter, classify_endpoint, rate_limit,
};
