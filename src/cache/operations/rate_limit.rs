use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::rate_limit_key;

/// Fixed-window counter operations. The counter itself lives in Redis and
/// self-expires, so stale windows never need explicit cleanup.
pub struct RateLimitCacheOperations;

impl RateLimitCacheOperations {
    /// Atomically count one request against the `(class, ip)` window and
    /// report `(count, seconds until the window resets)`.
    ///
    /// Uses the store's native INCR rather than read-modify-write on a JSON
    /// record, so concurrent requests from the same client cannot lose
    /// updates. The first increment of a window sets the TTL; the remaining
    /// TTL is what callers turn into `Retry-After` / reset timestamps.
    pub async fn increment(
        redis: &Arc<RedisClient>,
        class: &str,
        client_ip: &str,
        window_secs: u64,
    ) -> Result<(u32, u64), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = rate_limit_key(class, client_ip);
        let count: u32 = conn.incr(&key, 1).await?;

        if count == 1 {
            let _: () = conn.expire(&key, window_secs as i64).await?;
            return Ok((count, window_secs));
        }

        let ttl: i64 = conn.ttl(&key).await?;
        if ttl < 0 {
            // Counter exists without an expiry (the EXPIRE after the first
            // INCR was lost). Re-arm it so the window still closes.
            let _: () = conn.expire(&key, window_secs as i64).await?;
            return Ok((count, window_secs));
        }

        Ok((count, ttl as u64))
    }
}
