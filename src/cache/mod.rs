// Redis-backed shared state: rate-limit counters, the response cache and
// short-lived auth artifacts (verification codes, reset tokens).

pub mod keys;
pub mod models;
pub mod operations;

pub use models::response::CachedResponse;
pub use operations::rate_limit::RateLimitCacheOperations;
pub use operations::response::ResponseCacheOperations;
pub use operations::verification::VerificationCacheOperations;
