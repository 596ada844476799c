/// Rate-limit counter key prefix
const RATE_LIMIT_PREFIX: &str = "ratelimit:";

/// Cached GET response key prefix
pub const RESPONSE_CACHE_PREFIX: &str = "respcache:";

/// Email verification code key prefix
const VERIFICATION_CODE_PREFIX: &str = "verify:code:";

/// Password reset token key prefix (token stored hashed)
const RESET_TOKEN_PREFIX: &str = "reset:token:";

/// Counter key for one (endpoint class, client IP) pair.
pub fn rate_limit_key(class: &str, client_ip: &str) -> String {
    format!("{}{}:{}", RATE_LIMIT_PREFIX, class, client_ip)
}

/// Cache key for a normalized GET request identity (method + full URI).
pub fn response_cache_key(method: &str, uri: &str) -> String {
    format!("{}{}:{}", RESPONSE_CACHE_PREFIX, method, uri)
}

pub fn verification_code_key(email: &str) -> String {
    format!("{}{}", VERIFICATION_CODE_PREFIX, email.to_lowercase())
}

pub fn reset_token_key(token_hash: &str) -> String {
    format!("{}{}", RESET_TOKEN_PREFIX, token_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_by_prefix() {
        assert_eq!(rate_limit_key("sensitive", "1.2.3.4"), "ratelimit:sensitive:1.2.3.4");
        assert_eq!(
            response_cache_key("GET", "/api/v1/sermons?_page=1"),
            "respcache:GET:/api/v1/sermons?_page=1"
        );
        assert_eq!(verification_code_key("User@Example.com"), "verify:code:user@example.com");
    }
}
