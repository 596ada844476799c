use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::{RESPONSE_CACHE_PREFIX, response_cache_key};
use crate::cache::models::response::CachedResponse;

/// Shared response-cache operations for idempotent GET requests.
pub struct ResponseCacheOperations;

impl ResponseCacheOperations {
    pub async fn get(
        redis: &Arc<RedisClient>,
        uri: &str,
    ) -> Result<Option<CachedResponse>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = response_cache_key("GET", uri);
        let result: Option<String> = conn.get(key).await?;

        match result {
            Some(json) => {
                let cached = serde_json::from_str(&json).map_err(|e| {
                    redis::RedisError::from((
                        redis::ErrorKind::TypeError,
                        "cached response deserialization failed",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(cached))
            }
            None => Ok(None),
        }
    }

    pub async fn put(
        redis: &Arc<RedisClient>,
        uri: &str,
        response: &CachedResponse,
        ttl_secs: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = response_cache_key("GET", uri);
        let json = serde_json::to_string(response).map_err(|e| {
            redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "cached response serialization failed",
                e.to_string(),
            ))
        })?;

        let _: () = conn.set_ex(key, json, ttl_secs).await?;
        Ok(())
    }

    /// Delete every cached entry whose request URI contains `pattern` and
    /// return how many were removed. Used by mutation flows to invalidate
    /// previously cached list/detail views.
    pub async fn purge(
        redis: &Arc<RedisClient>,
        pattern: &str,
    ) -> Result<u64, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let mut matched: Vec<String> = Vec::new();
        let mut iter: redis::AsyncIter<String> = conn
            .scan_match(format!("{}*", RESPONSE_CACHE_PREFIX))
            .await?;
        while let Some(key) = iter.next_item().await {
            if matches_purge_pattern(&key, pattern) {
                matched.push(key);
            }
        }
        drop(iter);

        if matched.is_empty() {
            return Ok(0);
        }

        let mut conn = redis.get_multiplexed_async_connection().await?;
        let removed: u64 = conn.del(matched).await?;
        Ok(removed)
    }
}

/// Substring match over full cache keys, so a pattern can hit both the
/// client-facing and the admin spelling of a resource path.
pub fn matches_purge_pattern(key: &str, pattern: &str) -> bool {
    key.contains(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_hits_list_and_detail_keys() {
        let list = response_cache_key("GET", "/api/v1/sermons?page=1");
        let detail = response_cache_key("GET", "/api/v1/sermons/sermon-abc123");
        assert!(matches_purge_pattern(&list, "sermons"));
        assert!(matches_purge_pattern(&detail, "sermons"));
        assert!(!matches_purge_pattern(&list, "speakers"));
    }

    #[test]
    fn home_config_patterns_cover_both_read_paths() {
        // the same document is cached under the client path and the admin
        // curation path
        let client = response_cache_key("GET", "/api/v1/home/config");
        let admin = response_cache_key("GET", "/api/v1/curation/home-config");
        let patterns = ["home/config", "home-config"];

        assert!(patterns.iter().any(|p| matches_purge_pattern(&client, p)));
        assert!(patterns.iter().any(|p| matches_purge_pattern(&admin, p)));
    }

    #[test]
    fn launch_screen_pattern_covers_both_read_paths() {
        let client = response_cache_key("GET", "/api/v1/launch-screen");
        let admin = response_cache_key("GET", "/api/v1/curation/launch-screen-config");
        assert!(matches_purge_pattern(&client, "launch-screen"));
        assert!(matches_purge_pattern(&admin, "launch-screen"));
    }
}
