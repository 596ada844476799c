use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::{reset_token_key, verification_code_key};

/// Short-lived auth artifacts: email verification codes and password-reset
/// tokens. Both expire on their own; reset tokens are stored hashed and
/// consumed on use.
pub struct VerificationCacheOperations;

impl VerificationCacheOperations {
    pub async fn store_code(
        redis: &Arc<RedisClient>,
        email: &str,
        code: &str,
        ttl_secs: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(verification_code_key(email), code, ttl_secs).await?;
        Ok(())
    }

    pub async fn get_code(
        redis: &Arc<RedisClient>,
        email: &str,
    ) -> Result<Option<String>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        conn.get(verification_code_key(email)).await
    }

    pub async fn delete_code(
        redis: &Arc<RedisClient>,
        email: &str,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(verification_code_key(email)).await?;
        Ok(())
    }

    /// Store a reset token (already hashed) mapping to the user id.
    pub async fn store_reset_token(
        redis: &Arc<RedisClient>,
        token_hash: &str,
        user_id: &str,
        ttl_secs: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(reset_token_key(token_hash), user_id, ttl_secs).await?;
        Ok(())
    }

    pub async fn get_reset_token(
        redis: &Arc<RedisClient>,
        token_hash: &str,
    ) -> Result<Option<String>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        conn.get(reset_token_key(token_hash)).await
    }

    /// Fetch and delete in one step so a reset token is single-use.
    pub async fn take_reset_token(
        redis: &Arc<RedisClient>,
        token_hash: &str,
    ) -> Result<Option<String>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let key = reset_token_key(token_hash);
        let user_id: Option<String> = conn.get(&key).await?;
        if user_id.is_some() {
            let _: () = conn.del(&key).await?;
        }
        Ok(user_id)
    }
}
