use std::collections::HashMap;
use std::env;
use std::time::Duration;

use serde::Deserialize;

/// Permission granted to an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

/// Static record describing what a presented API key may do.
/// Loaded once at startup, immutable at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyDescriptor {
    pub name: String,
    pub permissions: Vec<Permission>,
    #[serde(default = "default_rate_class")]
    pub rate_limit_class: String,
    /// Exact paths, path prefixes, or the universal wildcard "*".
    pub allowed_endpoints: Vec<String>,
}

fn default_rate_class() -> String {
    "authenticated".to_string()
}

impl ApiKeyDescriptor {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn allows_endpoint(&self, path: &str) -> bool {
        self.allowed_endpoints.iter().any(|endpoint| {
            endpoint == "*" || path == endpoint || path.starts_with(&format!("{}/", endpoint))
        })
    }
}

/// Quota for one endpoint class: at most `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy)]
pub struct RateQuota {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,

    // CORS
    pub allowed_origins: Vec<String>,
    pub preview_origin_suffix: String,

    // API key registry
    pub api_keys: HashMap<String, ApiKeyDescriptor>,

    // Rate limiting, per endpoint class
    pub rate_limit_public: RateQuota,
    pub rate_limit_authenticated: RateQuota,
    pub rate_limit_semi_trusted: RateQuota,
    pub rate_limit_sensitive: RateQuota,

    // Response cache
    pub cache_static_max_age_secs: u64,
    pub cache_static_swr_secs: u64,
    pub cache_dynamic_max_age_secs: u64,
    pub cache_dynamic_swr_secs: u64,

    // Auth flows
    pub verification_code_ttl_secs: u64,
    pub reset_token_ttl_secs: u64,

    // Collaborators
    pub mail_api_url: String,
    pub mail_from_email: String,
    pub mail_from_name: String,
    pub blob_store_url: String,
    pub blob_store_token: String,
    pub blob_public_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // The registry is a JSON map of key -> descriptor. A malformed value
        // is a deployment error, not something to limp past.
        let api_keys = match env::var("API_KEYS") {
            Ok(json) => serde_json::from_str(&json).expect("API_KEYS is not valid JSON"),
            Err(_) => HashMap::new(),
        };

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: env_u64("JWT_EXPIRATION_SECS", 7 * 24 * 3600),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api/v1".into()),
            allowed_origins,
            preview_origin_suffix: env::var("PREVIEW_ORIGIN_SUFFIX")
                .unwrap_or_else(|_| ".pages.dev".into()),
            api_keys,
            rate_limit_public: RateQuota {
                max_requests: env_u32("RATE_LIMIT_PUBLIC_REQUESTS", 5000),
                window_secs: env_u64("RATE_LIMIT_PUBLIC_WINDOW", 3600),
            },
            rate_limit_authenticated: RateQuota {
                max_requests: env_u32("RATE_LIMIT_AUTHENTICATED_REQUESTS", 10000),
                window_secs: env_u64("RATE_LIMIT_AUTHENTICATED_WINDOW", 3600),
            },
            rate_limit_semi_trusted: RateQuota {
                max_requests: env_u32("RATE_LIMIT_SEMI_TRUSTED_REQUESTS", 1000),
                window_secs: env_u64("RATE_LIMIT_SEMI_TRUSTED_WINDOW", 3600),
            },
            rate_limit_sensitive: RateQuota {
                max_requests: env_u32("RATE_LIMIT_SENSITIVE_REQUESTS", 10),
                window_secs: env_u64("RATE_LIMIT_SENSITIVE_WINDOW", 3600),
            },
            cache_static_max_age_secs: env_u64("CACHE_STATIC_MAX_AGE", 3600),
            cache_static_swr_secs: env_u64("CACHE_STATIC_SWR", 86400),
            cache_dynamic_max_age_secs: env_u64("CACHE_DYNAMIC_MAX_AGE", 300),
            cache_dynamic_swr_secs: env_u64("CACHE_DYNAMIC_SWR", 60),
            verification_code_ttl_secs: env_u64("VERIFICATION_CODE_TTL", 600),
            reset_token_ttl_secs: env_u64("RESET_TOKEN_TTL", 1800),
            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.mailchannels.net/tx/v1/send".into()),
            mail_from_email: env::var("MAIL_FROM_EMAIL")
                .unwrap_or_else(|_| "support@example.com".into()),
            mail_from_name: env::var("MAIL_FROM_NAME")
                .unwrap_or_else(|_| "Sermon Platform".into()),
            blob_store_url: env::var("BLOB_STORE_URL").unwrap_or_default(),
            blob_store_token: env::var("BLOB_STORE_TOKEN").unwrap_or_default(),
            blob_public_url: env::var("BLOB_PUBLIC_URL").unwrap_or_default(),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// A fully populated config for unit tests; nothing here touches the
    /// environment.
    pub fn test_config() -> Config {
        let mut api_keys = HashMap::new();
        api_keys.insert(
            "share-web-key".to_string(),
            ApiKeyDescriptor {
                name: "Share Web".into(),
                permissions: vec![Permission::Read],
                rate_limit_class: "public".into(),
                allowed_endpoints: vec![
                    "/api/v1/sermons".into(),
                    "/api/v1/speakers".into(),
                    "/api/v1/topics".into(),
                ],
            },
        );
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
            allowed_origins: vec![
                "https://admin.example.com".into(),
                "http://localhost:3000".into(),
            ],
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_endpoint_matching() {
        let descriptor = ApiKeyDescriptor {
            name: "Share Web".into(),
            permissions: vec![Permission::Read],
            rate_limit_class: "public".into(),
            allowed_endpoints: vec!["/api/v1/sermons".into(), "/api/v1/speakers".into()],
        };

        assert!(descriptor.allows_endpoint("/api/v1/sermons"));
        assert!(descriptor.allows_endpoint("/api/v1/sermons/sermon-abc"));
        assert!(!descriptor.allows_endpoint("/api/v1/users"));
        // prefix matching only applies at a path-segment boundary
        assert!(!descriptor.allows_endpoint("/api/v1/sermonsx"));
    }

    #[test]
    fn descriptor_wildcard_allows_everything() {
        let descriptor = ApiKeyDescriptor {
            name: "Admin Panel".into(),
            permissions: vec![Permission::Read, Permission::Write, Permission::Admin],
            rate_limit_class: "authenticated".into(),
            allowed_endpoints: vec!["*".into()],
        };

        assert!(descriptor.allows_endpoint("/api/v1/anything/at/all"));
        assert!(descriptor.has_permission(Permission::Admin));
    }

    #[test]
    fn registry_parses_from_json() {
        let json = r#"{
            "share_web_key": {
                "name": "Share Web",
                "permissions": ["read"],
                "rate_limit_class": "public",
                "allowed_endpoints": ["/api/v1/sermons"]
            }
        }"#;
        let registry: HashMap<String, ApiKeyDescriptor> = serde_json::from_str(json).unwrap();
        let descriptor = &registry["share_web_key"];
        assert_eq!(descriptor.name, "Share Web");
        assert!(descriptor.has_permission(Permission::Read));
        assert!(!descriptor.has_permission(Permission::Write));
    }
}
